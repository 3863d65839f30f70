use std::io::Write;
use std::str::FromStr;

use golem_common::config::TelemetryConfig;
use log::{debug, LevelFilter};

use crate::error::{TelemetryError, TelemetryResult};

/// Installs the process-wide logger.
///
/// `RUST_LOG` takes precedence over the configured default level.
/// Calling this more than once returns an error since the logger can only be set once.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    let default_level = LevelFilter::from_str(&config.default_log_level).map_err(|_| {
        TelemetryError::invalid(format!(
            "invalid log level: {}",
            config.default_log_level
        ))
    })?;
    let logger = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level.as_str()),
    )
    .format(move |buf, record| {
        let level = record.level();
        let target = record.target();
        let style = buf.default_level_style(level);
        let timestamp = buf.timestamp();
        let args = record.args();
        writeln!(buf, "[{timestamp} {style}{level}{style:#} {target}] {args}")
    })
    .build();
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| TelemetryError::internal(e.to_string()))?;
    log::set_max_level(max_level);
    debug!("logger initialized");
    Ok(())
}

pub fn shutdown_telemetry() {
    debug!("shutting down logger...");
    log::logger().flush();
}
