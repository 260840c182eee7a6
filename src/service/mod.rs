//! Managed service restart trigger.
//!
//! # Data Flow
//! ```text
//! CycleController (restart phase)
//!     → node name → DNS (resolve.rs) → routable host
//!     → ServiceClient::restart(host, credentials)
//!         → splunk.rs (REST restart endpoint over reqwest)
//!     ← RestartResponse { status }
//! ```
//!
//! # Design Decisions
//! - Non-200 answers are responses, not errors; the loop decides what they mean
//! - Transport failures are errors and count as failed attempts

pub mod resolve;
pub mod splunk;

use async_trait::async_trait;
use thiserror::Error;

pub use resolve::resolve_host;
pub use splunk::SplunkRestClient;

/// Status code treated as a successful restart.
pub const RESTART_SUCCESS: u16 = 200;

/// Credentials passed through to the managed service.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outcome of a restart request that reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartResponse {
    pub status: u16,
}

impl RestartResponse {
    pub fn is_success(&self) -> bool {
        self.status == RESTART_SUCCESS
    }
}

/// Errors raised before a restart request produced a status.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("restart request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("could not resolve {host}: {reason}")]
    Resolve { host: String, reason: String },
}

/// Triggers a restart of the managed service on one host.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    async fn restart(
        &self,
        host: &str,
        credentials: &ServiceCredentials,
    ) -> Result<RestartResponse, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_200_is_success() {
        assert!(RestartResponse { status: 200 }.is_success());
        assert!(!RestartResponse { status: 201 }.is_success());
        assert!(!RestartResponse { status: 500 }.is_success());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = ServiceCredentials {
            user: "admin".into(),
            password: "changeme".into(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("changeme"));
    }
}
