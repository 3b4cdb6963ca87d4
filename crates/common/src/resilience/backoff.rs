//! Backoff strategy for retry delays
//!
//! The HTTP client retries with exponential backoff:
//! `initial_delay × base^attempt`, capped at `max_delay`, where `attempt`
//! counts from zero for the first retry.

use std::time::Duration;

/// Exponential backoff: initial_delay * base^attempt, capped at max_delay
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffStrategy {
    initial_delay: Duration,
    base: f64,
    max_delay: Duration,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            base: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl BackoffStrategy {
    /// Exponential strategy from millisecond settings
    pub fn exponential(base_delay_ms: u64, factor: f64, max_delay_ms: u64) -> Self {
        Self {
            initial_delay: Duration::from_millis(base_delay_ms),
            base: factor,
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Calculate the delay before retry number `attempt` (zero-based)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let delay = self.initial_delay.as_millis() as f64 * self.base.powi(exponent);
        let capped = delay.min(self.max_delay.as_millis() as f64);
        if capped.is_finite() && capped > 0.0 {
            Duration::from_millis(capped as u64)
        } else if capped.is_nan() || capped <= 0.0 {
            Duration::ZERO
        } else {
            self.max_delay
        }
    }

    /// Upper bound on any single delay this strategy produces
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}
