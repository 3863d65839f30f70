use std::time::Duration;

use golem_server::actor::ActorHandle;
use log::warn;
use tokio::sync::oneshot;

use crate::error::{ExecutionError, ExecutionResult};
use crate::id::JobId;
use crate::job::coordinator::actor::JobCoordinatorActor;
use crate::job::coordinator::event::JobCoordinatorEvent;
use crate::job::coordinator::options::JobCoordinatorOptions;
use crate::job::JobDetails;
use crate::protocol::{OutputStream, UnitOutcome, WorkUnit};

/// A cloneable client for the coordinator of one job.
#[derive(Clone)]
pub struct JobCoordinator {
    job_id: JobId,
    stop_timeout: Duration,
    handle: ActorHandle<JobCoordinatorActor>,
}

impl JobCoordinator {
    /// Starts the coordinator, which immediately begins submitting work units.
    pub fn start(options: JobCoordinatorOptions) -> Self {
        let job_id = options.job_id;
        let stop_timeout = options.stop_timeout;
        Self {
            job_id,
            stop_timeout,
            handle: ActorHandle::new(options),
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub async fn record_outcome(&self, unit: WorkUnit, outcome: UnitOutcome) -> ExecutionResult<()> {
        self.handle
            .send(JobCoordinatorEvent::RecordOutcome { unit, outcome })
            .await?;
        Ok(())
    }

    pub async fn record_submission(&self, unit: WorkUnit, host: String) -> ExecutionResult<()> {
        self.handle
            .send(JobCoordinatorEvent::RecordSubmission { unit, host })
            .await?;
        Ok(())
    }

    pub async fn append_output(&self, stream: OutputStream, chunk: String) -> ExecutionResult<()> {
        self.handle
            .send(JobCoordinatorEvent::AppendOutput { stream, chunk })
            .await?;
        Ok(())
    }

    /// Stops a running job. Returns `false` if the job was not running.
    ///
    /// Only the delivery of the request is bounded by the stop timeout.
    /// On timeout the request is dropped and the job keeps running.
    pub async fn stop(&self) -> ExecutionResult<bool> {
        let (tx, rx) = oneshot::channel();
        let event = JobCoordinatorEvent::Stop { result: tx };
        match tokio::time::timeout(self.stop_timeout, self.handle.send(event)).await {
            Ok(x) => x?,
            Err(_) => {
                warn!(
                    "job {} did not accept the stop request within {:?}",
                    self.job_id, self.stop_timeout
                );
                return Err(ExecutionError::StopTimeout(self.job_id));
            }
        }
        Ok(rx.await?)
    }

    /// Returns a copy of the job details. The copy may be stale by the time it is used.
    pub async fn snapshot(&self) -> ExecutionResult<JobDetails> {
        let (tx, rx) = oneshot::channel();
        self.handle
            .send(JobCoordinatorEvent::GetSnapshot { result: tx })
            .await?;
        Ok(rx.await?)
    }

    /// Stops the coordinator and waits until all job files are written.
    pub async fn shutdown(&self) {
        // The send fails if the coordinator has already stopped.
        let _ = self.handle.send(JobCoordinatorEvent::Shutdown).await;
        self.handle.clone().wait_for_stop().await;
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_stopped()
    }
}
