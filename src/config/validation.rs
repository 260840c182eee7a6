//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (budgets and poll caps > 0, ports valid)
//! - Check that alerts have somewhere to go
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CycleConfig → Result<(), Vec<ValidationError>>
//! - Runs before any external call is made

use thiserror::Error;
use url::Url;

use crate::config::schema::CycleConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at least 1")]
    Zero { field: &'static str },

    #[error("control_plane.url is not a valid URL: {0}")]
    InvalidUrl(String),

    #[error("service.scheme must be http or https, got {0}")]
    InvalidScheme(String),

    #[error("observability.log_level {0} is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &CycleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let cp = &config.control_plane;
    if cp.pool.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "control_plane.pool" });
    }
    if cp.partition.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "control_plane.partition" });
    }
    if let Err(e) = Url::parse(&cp.url) {
        errors.push(ValidationError::InvalidUrl(e.to_string()));
    }

    if config.service.scheme != "http" && config.service.scheme != "https" {
        errors.push(ValidationError::InvalidScheme(config.service.scheme.clone()));
    }
    if config.service.port == 0 {
        errors.push(ValidationError::Zero { field: "service.port" });
    }

    if config.restart.retries == 0 {
        errors.push(ValidationError::Zero { field: "restart.retries" });
    }
    if config.run.drain_max_polls == 0 {
        errors.push(ValidationError::Zero { field: "run.drain_max_polls" });
    }
    if config.run.recovery_max_polls == 0 {
        errors.push(ValidationError::Zero { field: "run.recovery_max_polls" });
    }

    if config.alerts.recipients.iter().all(|r| r.trim().is_empty()) {
        errors.push(ValidationError::Empty { field: "alerts.recipients" });
    }
    if config.alerts.smtp_relay.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "alerts.smtp_relay" });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }
    if config.observability.log_file.is_some() && config.observability.log_max_files == 0 {
        errors.push(ValidationError::Zero { field: "observability.log_max_files" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
