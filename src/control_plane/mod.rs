//! Load balancer control plane.
//!
//! # Data Flow
//! ```text
//! CycleController
//!     → ControlPlane trait (pool/member status, enable/disable, counters, node names)
//!         → f5.rs (iControl REST over reqwest)
//!         → test doubles (deterministic responses)
//!     ← types.rs (ObjectStatus, MemberStatus, ConnectionStats)
//!     ← counter.rs (64-bit counter rebuilt from signed halves)
//! ```
//!
//! # Design Decisions
//! - The loop only sees the trait; concrete clients are picked in main.rs
//! - Calls are awaited one at a time, never fanned out
//! - Errors carry enough context to name the failing request in an alert

pub mod counter;
pub mod f5;
pub mod types;

use async_trait::async_trait;

pub use counter::reconstruct_u64;
pub use f5::F5RestClient;
pub use types::{
    Availability, ConnectionStats, ControlPlaneError, ControlPlaneResult, EnabledState,
    MemberStatus, ObjectStatus, PoolMember,
};

/// Capabilities the cycle loop needs from the load balancer.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Partition subsequent calls operate in.
    async fn active_partition(&self) -> ControlPlaneResult<String>;

    /// Switch partitions, returning the partition now active.
    async fn set_active_partition(&self, partition: &str) -> ControlPlaneResult<String>;

    /// Pool-level availability and enabled state.
    async fn pool_status(&self, pool: &str) -> ControlPlaneResult<ObjectStatus>;

    /// Every member of the pool, in the order the control plane lists them.
    async fn member_status(&self, pool: &str) -> ControlPlaneResult<Vec<MemberStatus>>;

    /// Enable or disable a member for new connections.
    async fn set_member_enabled(
        &self,
        pool: &str,
        member: &PoolMember,
        enabled: bool,
    ) -> ControlPlaneResult<()>;

    /// Server-side current connections for a member.
    async fn member_connection_stats(
        &self,
        pool: &str,
        member: &PoolMember,
    ) -> ControlPlaneResult<ConnectionStats>;

    /// Display name of the node behind an address, with the node suffix stripped.
    async fn node_display_name(&self, address: &str) -> ControlPlaneResult<String>;
}
