use std::time::Duration;

use golem_common::config::AppConfig;

#[readonly::make]
pub struct LocalWorkerOptions {
    pub capacity: usize,
    pub checkin_interval: Duration,
}

impl LocalWorkerOptions {
    pub fn new(config: &AppConfig, capacity: usize) -> Self {
        Self {
            capacity,
            checkin_interval: Duration::from_secs(config.worker.checkin_interval_secs.max(1)),
        }
    }
}
