//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Cycle loop and clients produce:
//!     → logging.rs (structured log events, console + optional file)
//!     → metrics.rs (counters and gauges, rendered to a textfile per run)
//! ```
//!
//! # Design Decisions
//! - Every run gets a `cycle` span with a run ID
//! - Metrics are recorded through the `metrics` facade; without a recorder they are no-ops

pub mod logging;
pub mod metrics;
