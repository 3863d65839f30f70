use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::CommonResult;

const DEFAULT_CONFIG: &str = include_str!("default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub master: MasterConfig,
    pub job: JobConfig,
    pub worker: WorkerConfig,
}

impl AppConfig {
    /// Loads the configuration from the built-in defaults,
    /// overridden by `GOLEM__` environment variables
    /// (e.g. `GOLEM__JOB__LOG_DIR` for `job.log_dir`).
    pub fn load() -> CommonResult<Self> {
        Ok(Figment::from(Toml::string(DEFAULT_CONFIG))
            .admerge(Env::prefixed("GOLEM__").map(|p| p.as_str().replace("__", ".").into()))
            .extract()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub default_log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    pub dispatch_queue_size: usize,
    pub broadcast_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub log_dir: String,
    pub stop_timeout_millis: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub connection_buffer: usize,
    pub checkin_interval_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommonError;

    #[test]
    fn test_default_config() -> CommonResult<()> {
        let config: AppConfig = Figment::from(Toml::string(DEFAULT_CONFIG))
            .extract()?;
        assert_eq!(config.telemetry.default_log_level, "info");
        assert_eq!(config.master.dispatch_queue_size, 1000);
        assert_eq!(config.master.broadcast_buffer, 16);
        assert_eq!(config.job.log_dir, ".");
        assert_eq!(config.job.stop_timeout_millis, 250);
        assert_eq!(config.worker.connection_buffer, 1000);
        assert_eq!(config.worker.checkin_interval_secs, 60);
        Ok(())
    }

    #[test]
    fn test_nested_override() -> CommonResult<()> {
        let config: AppConfig = Figment::from(Toml::string(DEFAULT_CONFIG))
            .admerge(Toml::string("[job]\nlog_dir = \"/var/log/golem\""))
            .extract()?;
        assert_eq!(config.job.log_dir, "/var/log/golem");
        assert_eq!(config.job.stop_timeout_millis, 250);
        Ok(())
    }

    #[test]
    fn test_invalid_override() {
        let config = Figment::from(Toml::string(DEFAULT_CONFIG))
            .admerge(Toml::string("[master]\ndispatch_queue_size = \"many\""))
            .extract::<AppConfig>()
            .map_err(CommonError::from);
        assert!(matches!(config, Err(CommonError::InvalidConfig(_))));
    }
}
