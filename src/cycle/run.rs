//! Per-invocation run state.

use uuid::Uuid;

use crate::control_plane::PoolMember;
use crate::observability::metrics;

/// Phase of the member currently being cycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Verify,
    Drain,
    Restart,
    Recovery,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Verify => "verify",
            Phase::Drain => "drain",
            Phase::Restart => "restart",
            Phase::Recovery => "recovery",
        }
    }
}

/// State of one cycle run. Lives for a single process execution.
#[derive(Debug, Clone)]
pub struct CycleRun {
    pub run_id: Uuid,
    pub pool: String,
    /// Members in the order the control plane listed them.
    pub members: Vec<PoolMember>,
    /// Members fully cycled so far.
    pub cycled: usize,
    phase: Phase,
    phase_polls: u32,
}

impl CycleRun {
    pub fn new(
        run_id: Uuid,
        pool: impl Into<String>,
        members: Vec<PoolMember>,
    ) -> Self {
        Self {
            run_id,
            pool: pool.into(),
            members,
            cycled: 0,
            phase: Phase::Verify,
            phase_polls: 0,
        }
    }

    /// Enter a phase, resetting its poll counter.
    pub fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.phase_polls = 0;
    }

    /// Count one poll in the current phase and return the new count.
    pub fn record_poll(&mut self) -> u32 {
        self.phase_polls += 1;
        metrics::record_phase_poll(self.phase.as_str());
        self.phase_polls
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_polls(&self) -> u32 {
        self.phase_polls
    }
}
