mod core;
mod handler;

use std::collections::HashMap;

use crate::id::{JobId, NodeId};
use crate::job::JobCoordinator;
use crate::master::options::MasterOptions;
use crate::worker::WorkerHandle;

/// The registry of jobs and workers.
pub(super) struct MasterActor {
    options: MasterOptions,
    jobs: HashMap<JobId, JobCoordinator>,
    workers: HashMap<NodeId, WorkerHandle>,
}
