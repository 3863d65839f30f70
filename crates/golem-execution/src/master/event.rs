use tokio::sync::oneshot;

use crate::error::ExecutionResult;
use crate::id::{JobId, NodeId};
use crate::job::{JobCoordinator, JobMetadata, Task};
use crate::worker::WorkerHandle;

pub enum MasterEvent {
    CreateJob {
        metadata: JobMetadata,
        tasks: Vec<Task>,
        result: oneshot::Sender<ExecutionResult<JobId>>,
    },
    GetJob {
        job_id: JobId,
        result: oneshot::Sender<ExecutionResult<JobCoordinator>>,
    },
    ListJobs {
        result: oneshot::Sender<Vec<JobCoordinator>>,
    },
    /// Removes a job from the registry. The job record stays in the store.
    RemoveJob {
        job_id: JobId,
        result: oneshot::Sender<ExecutionResult<JobCoordinator>>,
    },
    RegisterWorker {
        worker: WorkerHandle,
    },
    DeregisterWorker {
        node_id: NodeId,
    },
    GetWorker {
        node_id: NodeId,
        result: oneshot::Sender<ExecutionResult<WorkerHandle>>,
    },
    ListWorkers {
        result: oneshot::Sender<Vec<WorkerHandle>>,
    },
    Shutdown,
}
