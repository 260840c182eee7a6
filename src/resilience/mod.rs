//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Restart attempt fails:
//!     → retries.rs (attempt budget, delay before the next attempt)
//!     → backoff.rs (optional jittered exponential delay)
//! ```
//!
//! # Design Decisions
//! - The attempt budget includes the first attempt
//! - Delay is fixed by default; exponential growth is opt-in
//! - No delay after the final attempt

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
