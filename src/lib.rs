//! Rolling, connection-aware restart of a load balancer pool.

pub mod config;
pub mod control_plane;
pub mod cycle;
pub mod health;
pub mod notify;
pub mod observability;
pub mod resilience;
pub mod service;

pub use config::schema::CycleConfig;
pub use cycle::{CycleController, CycleSettings, RunOutcome};
