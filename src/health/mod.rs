//! Pool and member health verification.
//!
//! # Data Flow
//! ```text
//! Before any member is touched:
//!     ControlPlane::pool_status   → verify_pool    → healthy? else alert + stop
//!     ControlPlane::member_status → verify_members → any down? else alert + stop
//! ```
//!
//! # Design Decisions
//! - Read-only: verification never mutates the pool
//! - Fail fast: an unhealthy pool is not retried
//! - Healthy means exactly (available, enabled)

pub mod verify;

pub use verify::{partition_members, verify_members, verify_pool, MemberReport, PoolVerdict};
