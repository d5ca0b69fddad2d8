//! Exponential backoff policy for provider calls.

use std::time::Duration;

use crate::config::GenerationConfig;

/// Retry knobs passed into the [`Generator`](super::Generator) at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Deadline for a single provider call. Exceeding it counts as a retryable failure.
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, call_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            call_timeout,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Delay after the failed attempt with zero-based index `attempt`: `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Sum of every backoff the policy sleeps when all attempts fail.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts)
            .map(|n| self.delay_for(n))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1), Duration::from_secs(45))
    }
}
