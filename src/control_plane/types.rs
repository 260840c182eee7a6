//! Pool and member status types shared by the control plane and the cycle loop.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::control_plane::counter::reconstruct_u64;

/// Load-balancer-reported health signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    NotAvailable,
}

/// Administrative traffic-eligibility flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnabledState {
    Enabled,
    Disabled,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::NotAvailable => write!(f, "not-available"),
        }
    }
}

impl fmt::Display for EnabledState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnabledState::Enabled => write!(f, "enabled"),
            EnabledState::Disabled => write!(f, "disabled"),
        }
    }
}

/// Availability and enabled state of a pool or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStatus {
    pub availability: Availability,
    pub enabled: EnabledState,
}

impl ObjectStatus {
    /// Create a status pair.
    pub fn new(availability: Availability, enabled: EnabledState) -> Self {
        Self { availability, enabled }
    }

    /// Healthy means available and enabled; every other combination is not.
    pub fn is_healthy(&self) -> bool {
        self.availability == Availability::Available && self.enabled == EnabledState::Enabled
    }
}

impl fmt::Display for ObjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.availability, self.enabled)
    }
}

/// A pool member, identified by address and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolMember {
    pub address: String,
    pub port: u16,
}

impl PoolMember {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for PoolMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// One entry of a pool's member status listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStatus {
    pub member: PoolMember,
    pub status: ObjectStatus,
}

/// Current-connections counter as reported by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub high: i32,
    pub low: i32,
}

impl ConnectionStats {
    /// Active connections as an unsigned count.
    pub fn current(&self) -> u64 {
        reconstruct_u64(self.high, self.low)
    }
}

/// Errors raised by control plane clients.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("control plane request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("control plane returned {status} for {path}")]
    Status { status: u16, path: String },

    /// The response did not have the expected shape.
    #[error("unexpected control plane response: {0}")]
    Decode(String),

    /// Partition does not exist.
    #[error("unknown partition: {0}")]
    UnknownPartition(String),

    /// No node object carries this address.
    #[error("no node found for address {0}")]
    NodeNotFound(String),

    /// Invalid base URL or path.
    #[error("invalid control plane URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for control plane operations.
pub type ControlPlaneResult<T> = Result<T, ControlPlaneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_available_enabled_is_healthy() {
        let pairs = [
            (Availability::Available, EnabledState::Enabled, true),
            (Availability::Available, EnabledState::Disabled, false),
            (Availability::NotAvailable, EnabledState::Enabled, false),
            (Availability::NotAvailable, EnabledState::Disabled, false),
        ];
        for (availability, enabled, healthy) in pairs {
            assert_eq!(ObjectStatus::new(availability, enabled).is_healthy(), healthy);
        }
    }

    #[test]
    fn test_display() {
        let member = PoolMember::new("10.0.0.5", 8089);
        assert_eq!(member.to_string(), "10.0.0.5:8089");

        let status = ObjectStatus::new(Availability::NotAvailable, EnabledState::Disabled);
        assert_eq!(status.to_string(), "not-available disabled");
    }

    #[test]
    fn test_connection_stats_current() {
        let stats = ConnectionStats { high: 0, low: 42 };
        assert_eq!(stats.current(), 42);
        let stats = ConnectionStats { high: -1, low: -1 };
        assert_eq!(stats.current(), u64::MAX);
    }
}
