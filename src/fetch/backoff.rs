//! Delays between fetch attempts

use rand::Rng;
use std::time::Duration;

/// Growth factor of the scripted backoff
const BACKOFF_FACTOR: f64 = 1.6;

/// Retry delay policy shared by every request of a fetcher
#[derive(Debug, Clone, Copy)]
pub struct RetryDelays {
    /// Fixed pause after a failed plain request
    pub fixed: Duration,

    /// Upper bound of the random jitter added to scripted backoff
    pub jitter: Duration,
}

impl Default for RetryDelays {
    fn default() -> Self {
        Self {
            fixed: Duration::from_secs(5),
            jitter: Duration::from_millis(500),
        }
    }
}

impl RetryDelays {
    /// Delay after a failed plain HTTP attempt
    pub fn plain(&self) -> Duration {
        self.fixed
    }

    /// Delay after failed scripted attempt number `attempt` (1-based)
    ///
    /// `base * 1.6^(attempt - 1)` plus up to `jitter` of random noise.
    pub fn scripted(&self, attempt: u32, base: Duration) -> Duration {
        geometric(attempt, base) + random_up_to(self.jitter)
    }
}

/// The deterministic part of the scripted backoff
pub fn geometric(attempt: u32, base: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32) as i32;
    Duration::try_from_secs_f64(base.as_secs_f64() * BACKOFF_FACTOR.powi(exponent))
        .unwrap_or(Duration::MAX)
}

/// Returns a uniformly random duration in `[0, max)`
pub fn random_up_to(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(rand::thread_rng().gen_range(0.0..max.as_secs_f64()))
}
