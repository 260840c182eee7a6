//! Alert delivery.
//!
//! # Data Flow
//! ```text
//! CycleController (anomaly observed)
//!     → AlertEvent { recipients, subject, body }
//!     → Notifier::send
//!         → smtp.rs (plain SMTP relay)
//! ```
//!
//! # Design Decisions
//! - Fire-and-forget: a failed send is logged by the caller, never retried
//! - Recipients and subject are fixed per run; only the body varies

pub mod smtp;

use async_trait::async_trait;
use thiserror::Error;

pub use smtp::SmtpNotifier;

/// A single alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Errors raised while delivering an alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("SMTP relay rejected {command}: {reply}")]
    Rejected { command: String, reply: String },

    #[error("alert has no recipients")]
    NoRecipients,
}

/// Sends alerts to operators.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alert: &AlertEvent) -> Result<(), NotifyError>;
}
