use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use golem_common::config::AppConfig;
use tokio::sync::broadcast;

use crate::protocol::WorkerMessage;
use crate::queue::DispatchQueue;
use crate::store::JobStore;

#[readonly::make]
pub struct MasterOptions {
    pub log_dir: PathBuf,
    pub stop_timeout: Duration,
    pub queue: DispatchQueue,
    pub broadcast: broadcast::Sender<WorkerMessage>,
    pub store: Arc<dyn JobStore>,
}

impl MasterOptions {
    pub fn new(config: &AppConfig, store: Arc<dyn JobStore>) -> Self {
        let (broadcast, _) = broadcast::channel(config.master.broadcast_buffer.max(1));
        Self {
            log_dir: PathBuf::from(&config.job.log_dir),
            stop_timeout: Duration::from_millis(config.job.stop_timeout_millis),
            queue: DispatchQueue::new(config.master.dispatch_queue_size),
            broadcast,
            store,
        }
    }
}
