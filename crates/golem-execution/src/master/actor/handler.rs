use golem_server::actor::{ActorAction, ActorContext};
use log::{info, warn};
use tokio::sync::oneshot;

use crate::error::{ExecutionError, ExecutionResult};
use crate::id::{JobId, NodeId};
use crate::job::{
    total_tasks, JobCoordinator, JobCoordinatorOptions, JobDetails, JobMetadata, Task,
};
use crate::master::actor::MasterActor;
use crate::worker::WorkerHandle;

impl MasterActor {
    pub(super) fn handle_create_job(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        metadata: JobMetadata,
        tasks: Vec<Task>,
        result: oneshot::Sender<ExecutionResult<JobId>>,
    ) -> ActorAction {
        let out = self.create_job(metadata, tasks);
        let _ = result.send(out);
        ActorAction::Continue
    }

    fn create_job(&mut self, metadata: JobMetadata, tasks: Vec<Task>) -> ExecutionResult<JobId> {
        let job_id = JobId::generate();
        let total = total_tasks(&tasks);
        let details = JobDetails::new(job_id, &metadata, total);
        self.options().store.create(&details)?;
        let options = JobCoordinatorOptions::new(job_id, metadata, tasks, self.options());
        self.jobs.insert(job_id, JobCoordinator::start(options));
        info!("created job {job_id} with {total} work units");
        Ok(job_id)
    }

    pub(super) fn handle_get_job(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        job_id: JobId,
        result: oneshot::Sender<ExecutionResult<JobCoordinator>>,
    ) -> ActorAction {
        let out = self
            .jobs
            .get(&job_id)
            .cloned()
            .ok_or(ExecutionError::JobNotFound(job_id));
        let _ = result.send(out);
        ActorAction::Continue
    }

    pub(super) fn handle_list_jobs(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        result: oneshot::Sender<Vec<JobCoordinator>>,
    ) -> ActorAction {
        let _ = result.send(self.jobs.values().cloned().collect());
        ActorAction::Continue
    }

    pub(super) fn handle_remove_job(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        job_id: JobId,
        result: oneshot::Sender<ExecutionResult<JobCoordinator>>,
    ) -> ActorAction {
        let out = self
            .jobs
            .remove(&job_id)
            .ok_or(ExecutionError::JobNotFound(job_id));
        if out.is_ok() {
            info!("removed job {job_id}");
        }
        let _ = result.send(out);
        ActorAction::Continue
    }

    pub(super) fn handle_register_worker(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        worker: WorkerHandle,
    ) -> ActorAction {
        let node_id = worker.node_id();
        info!(
            "registered worker {node_id} on {} with capacity {}",
            worker.hostname(),
            worker.stats().capacity
        );
        if self.workers.insert(node_id, worker).is_some() {
            return ActorAction::warn(format!("worker {node_id} was registered twice"));
        }
        ActorAction::Continue
    }

    pub(super) fn handle_deregister_worker(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        node_id: NodeId,
    ) -> ActorAction {
        match self.workers.remove(&node_id) {
            Some(worker) => info!("deregistered worker {node_id} on {}", worker.hostname()),
            None => warn!("cannot deregister unknown worker {node_id}"),
        }
        ActorAction::Continue
    }

    pub(super) fn handle_get_worker(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        node_id: NodeId,
        result: oneshot::Sender<ExecutionResult<WorkerHandle>>,
    ) -> ActorAction {
        let out = self
            .workers
            .get(&node_id)
            .cloned()
            .ok_or(ExecutionError::WorkerNotFound(node_id));
        let _ = result.send(out);
        ActorAction::Continue
    }

    pub(super) fn handle_list_workers(
        &mut self,
        _ctx: &mut ActorContext<Self>,
        result: oneshot::Sender<Vec<WorkerHandle>>,
    ) -> ActorAction {
        let _ = result.send(self.workers.values().cloned().collect());
        ActorAction::Continue
    }
}
