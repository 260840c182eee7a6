//! Exponential restart delay with jitter.

use rand::Rng;
use std::time::Duration;

/// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at `cap`, plus up to 10% jitter. Attempt 0 has no delay.
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let Some(exponent) = attempt.checked_sub(1) else {
        return Duration::ZERO;
    };

    let delay = 2u32
        .checked_pow(exponent)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(cap, |grown| grown.min(cap));

    let spread = delay / 10;
    if spread.is_zero() {
        return delay;
    }
    delay + rand::thread_rng().gen_range(Duration::ZERO..spread)
}
