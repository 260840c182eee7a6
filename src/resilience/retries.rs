//! Restart retry policy.
//!
//! # Responsibilities
//! - Bound the number of restart attempts per member
//! - Compute the delay before the next attempt

use std::time::Duration;

use crate::config::RestartConfig;
use crate::resilience::backoff::backoff_delay;

/// How many restart attempts a member gets and how long to wait between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay after a failed attempt (base delay when exponential).
    pub delay: Duration,
    /// Grow the delay exponentially with jitter.
    pub exponential: bool,
    /// Upper bound for exponential delays.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Fixed-delay policy.
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay,
            exponential: false,
            max_delay: delay,
        }
    }

    /// Build from configuration; the delay falls back to the poll interval.
    pub fn from_config(config: &RestartConfig, poll_interval: Duration) -> Self {
        let delay = config
            .delay_secs
            .map(Duration::from_secs)
            .unwrap_or(poll_interval);
        Self {
            attempts: config.retries,
            delay,
            exponential: config.exponential_backoff,
            max_delay: Duration::from_secs(config.max_delay_secs).max(delay),
        }
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.attempts
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if !self.exponential {
            return self.delay;
        }
        backoff_delay(attempt, self.delay, self.max_delay)
    }
}
