use golem_server::actor::ActorHandle;
use log::{error, info};
use tokio::sync::oneshot;

use crate::id::JobId;
use crate::job::coordinator::actor::JobCoordinatorActor;
use crate::job::coordinator::event::JobCoordinatorEvent;
use crate::job::{expand_tasks, Task};
use crate::queue::DispatchQueue;

/// Feeds the work units of one job into the dispatch queue
/// until all units are enqueued or the stop signal fires.
pub(super) struct TaskSubmitter {
    handle: ActorHandle<JobCoordinatorActor>,
    job_id: JobId,
    tasks: Vec<Task>,
    queue: DispatchQueue,
    signal: oneshot::Receiver<()>,
}

impl TaskSubmitter {
    pub fn new(
        handle: ActorHandle<JobCoordinatorActor>,
        job_id: JobId,
        tasks: Vec<Task>,
        queue: DispatchQueue,
        signal: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            handle,
            job_id,
            tasks,
            queue,
            signal,
        }
    }

    pub async fn run(self) {
        let Self {
            handle,
            job_id,
            tasks,
            queue,
            mut signal,
        } = self;
        let mut submitted = 0u64;
        let mut stopped = false;
        for unit in expand_tasks(job_id, &tasks) {
            // The stop signal takes priority over an enqueue that is ready at the same time.
            tokio::select! {
                biased;
                _ = &mut signal => {
                    stopped = true;
                    break;
                }
                result = queue.submit(unit) => {
                    if let Err(e) = result {
                        error!("failed to submit work unit for job {job_id}: {e}");
                        break;
                    }
                    submitted += 1;
                }
            }
        }
        if stopped {
            info!("job {job_id} stopped after submitting {submitted} work units");
        } else {
            info!("job {job_id} submitted {submitted} work units");
        }
        let _ = handle
            .send(JobCoordinatorEvent::SubmissionFinished { submitted, stopped })
            .await;
    }
}
