//! Results of each phase and of a whole run.

use crate::control_plane::{ObjectStatus, PoolMember};

/// How the drain phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Connections reached zero on poll `polls`.
    Drained { polls: u32 },
    /// Poll cap reached with connections still open. Not an error.
    TimedOut { polls: u32, remaining: u64 },
}

/// How the restart phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// The service accepted the restart on attempt `attempts`.
    Restarted { attempts: u32 },
    /// Every attempt in the budget failed.
    Exhausted { attempts: u32 },
}

/// How the recovery wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Healthy { polls: u32 },
    TimedOut { polls: u32 },
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every member was drained, restarted, recovered and re-enabled.
    Completed { cycled: usize },
    /// Pool was not (available, enabled); nothing was touched.
    PoolUnhealthy { status: ObjectStatus },
    /// Members were already down; nothing was touched.
    MembersDown { members: Vec<PoolMember> },
    /// A member stayed unavailable past the recovery cap; it is left disabled.
    RecoveryTimeout { member: PoolMember, cycled: usize },
    /// Every restart attempt failed and the run is configured to stop on that.
    RestartExhausted { member: PoolMember, cycled: usize },
    /// The control plane failed mid-run.
    ControlPlane {
        stage: &'static str,
        error: String,
        cycled: usize,
    },
}

impl RunOutcome {
    /// True only when every member was cycled.
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    /// Members fully cycled before the run ended.
    pub fn cycled(&self) -> usize {
        match self {
            RunOutcome::Completed { cycled }
            | RunOutcome::RecoveryTimeout { cycled, .. }
            | RunOutcome::RestartExhausted { cycled, .. }
            | RunOutcome::ControlPlane { cycled, .. } => *cycled,
            RunOutcome::PoolUnhealthy { .. } | RunOutcome::MembersDown { .. } => 0,
        }
    }
}
