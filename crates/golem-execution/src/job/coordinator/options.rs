use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::id::JobId;
use crate::job::{JobMetadata, Task};
use crate::master::MasterOptions;
use crate::queue::DispatchQueue;
use crate::store::JobStore;

#[readonly::make]
pub struct JobCoordinatorOptions {
    pub job_id: JobId,
    pub metadata: JobMetadata,
    pub tasks: Vec<Task>,
    pub log_dir: PathBuf,
    pub stop_timeout: Duration,
    pub queue: DispatchQueue,
    pub store: Arc<dyn JobStore>,
}

impl JobCoordinatorOptions {
    pub fn new(
        job_id: JobId,
        metadata: JobMetadata,
        tasks: Vec<Task>,
        master: &MasterOptions,
    ) -> Self {
        Self {
            job_id,
            metadata,
            tasks,
            log_dir: master.log_dir.clone(),
            stop_timeout: master.stop_timeout,
            queue: master.queue.clone(),
            store: Arc::clone(&master.store),
        }
    }
}
