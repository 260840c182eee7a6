//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a cycle run.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for a pool cycle run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CycleConfig {
    /// Load balancer control plane connection and target pool.
    pub control_plane: ControlPlaneConfig,

    /// Managed service restart endpoint and credentials.
    pub service: ServiceConfig,

    /// Restart retry policy.
    pub restart: RestartConfig,

    /// Poll interval and per-phase poll caps.
    pub run: RunConfig,

    /// Alert delivery settings.
    pub alerts: AlertConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Load balancer control plane configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// Management API base URL (e.g., "https://bigip.example.com").
    pub url: String,

    /// API user.
    pub user: String,

    /// API password.
    pub password: String,

    /// Partition holding the pool.
    pub partition: String,

    /// Pool to cycle.
    pub pool: String,

    /// Partition holding node objects (used for node name lookups).
    pub node_partition: String,

    /// Suffix stripped from node display names before DNS resolution.
    pub node_suffix: String,

    /// Verify the control plane TLS certificate.
    pub verify_tls: bool,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost".to_string(),
            user: "admin".to_string(),
            password: String::new(),
            partition: "Common".to_string(),
            pool: String::new(),
            node_partition: "Common".to_string(),
            node_suffix: "-lb".to_string(),
            verify_tls: true,
            request_timeout_secs: 30,
        }
    }
}

/// Managed service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// URL scheme of the management port ("https" or "http").
    pub scheme: String,

    /// Management port of the service on each member host.
    pub port: u16,

    /// Service user with restart permission.
    pub user: String,

    /// Service password.
    pub password: String,

    /// Verify the service TLS certificate.
    pub verify_tls: bool,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Restart this host instead of the resolved member address.
    ///
    /// Only meant for exercising the loop against a single local instance.
    pub target_override: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            port: 8089,
            user: "admin".to_string(),
            password: String::new(),
            verify_tls: false,
            request_timeout_secs: 60,
            target_override: None,
        }
    }
}

/// Restart retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RestartConfig {
    /// Total restart attempts per member, including the first.
    pub retries: u32,

    /// Delay between failed attempts in seconds. Defaults to the poll interval.
    pub delay_secs: Option<u64>,

    /// Grow the delay exponentially (with jitter) instead of keeping it fixed.
    pub exponential_backoff: bool,

    /// Cap for the exponential delay in seconds.
    pub max_delay_secs: u64,

    /// End the run when every attempt failed instead of waiting for recovery anyway.
    pub abort_on_exhaustion: bool,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            delay_secs: None,
            exponential_backoff: false,
            max_delay_secs: 300,
            abort_on_exhaustion: false,
        }
    }
}

/// Poll loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Seconds between polls in every phase.
    pub poll_interval_secs: u64,

    /// Maximum connection-count polls while draining.
    pub drain_max_polls: u32,

    /// Maximum member-status polls while waiting for recovery.
    pub recovery_max_polls: u32,
}

impl RunConfig {
    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            drain_max_polls: 12,
            recovery_max_polls: 14,
        }
    }
}

/// Alert delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Recipient addresses.
    pub recipients: Vec<String>,

    /// Sender address.
    pub from: String,

    /// Subject line for every alert.
    pub subject: String,

    /// SMTP relay host.
    pub smtp_relay: String,

    /// SMTP relay port.
    pub smtp_port: u16,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            from: "pool-cycle@localhost".to_string(),
            subject: "pool cycle alert".to_string(),
            smtp_relay: "localhost".to_string(),
            smtp_port: 25,
        }
    }
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Optional log file, appended to alongside console output.
    pub log_file: Option<String>,

    /// How often the log file rolls over.
    pub log_rotation: LogRotation,

    /// Rolled log files kept, including the active one.
    pub log_max_files: usize,

    /// Optional Prometheus textfile written at the end of each run.
    pub metrics_textfile: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            log_rotation: LogRotation::Daily,
            log_max_files: 5,
            metrics_textfile: None,
        }
    }
}
