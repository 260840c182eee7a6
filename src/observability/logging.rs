//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Console output always, plain-text rolling file output when configured
//! - `RUST_LOG` overrides the configured level

use std::path::Path;
use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogRotation, ObservabilityConfig};

/// Errors raised while setting up logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log file path {0} has no file name")]
    FileName(String),

    #[error("cannot open log file {path}: {source}")]
    File { path: String, source: InitError },

    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Default filter directives for a configured level.
pub fn default_directives(level: &str) -> String {
    format!("pool_cycle={},warn", level.to_ascii_lowercase())
}

fn rotation(period: LogRotation) -> Rotation {
    match period {
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}

/// Rolling writer for `path`.
///
/// The file name becomes the prefix of every rolled file (`pool_cycle.log.2024-05-01`),
/// and only the newest `log_max_files` are kept.
pub fn rolling_appender(
    path: &str,
    config: &ObservabilityConfig,
) -> Result<RollingFileAppender, LoggingError> {
    let file = Path::new(path);
    let prefix = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| LoggingError::FileName(path.to_string()))?;
    let directory = file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    RollingFileAppender::builder()
        .rotation(rotation(config.log_rotation))
        .filename_prefix(prefix)
        .max_log_files(config.log_max_files)
        .build(directory)
        .map_err(|source| LoggingError::File {
            path: path.to_string(),
            source,
        })
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let file_layer = match &config.log_file {
        Some(path) => {
            let appender = rolling_appender(path, config)?;
            Some(fmt::layer().with_ansi(false).with_writer(appender))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(())
}
