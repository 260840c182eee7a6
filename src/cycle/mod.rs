//! Drain-restart-verify control loop.
//!
//! # State Machine (per member)
//! ```text
//! ENABLED
//!   → disable → DISABLING → poll connections → DRAINED | DRAIN_TIMEOUT
//!   → RESTART_ATTEMPT (× retry budget) → RESTARTED | RESTART_EXHAUSTED
//!   → WAITING_HEALTHY → HEALTHY | RECOVERY_TIMEOUT (alert, stop run)
//!   → enable → next member
//! ```
//!
//! # Design Decisions
//! - Strictly sequential: one member is fully cycled before the next is touched
//! - Every wait is a bounded poll loop over an injected `Pause`
//! - Drain timeouts proceed silently; recovery timeouts stop the whole run
//! - Nothing is rolled back on an early stop

pub mod controller;
pub mod outcome;
pub mod pause;
pub mod run;

pub use controller::{CycleController, CycleSettings};
pub use outcome::{DrainOutcome, RecoveryOutcome, RestartOutcome, RunOutcome};
pub use pause::{Pause, TokioPause};
pub use run::{CycleRun, Phase};
