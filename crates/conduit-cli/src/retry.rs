//! Bounded retry schedule for connection failures.

use std::time::Duration;

use conduit_config::Config;

/// Ceiling on any single backoff.
pub const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Attempt budget and exponential backoff for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` counts the first try and is at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    /// Policy built from `retry_attempts` and `retry_backoff_ms`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.retry_attempts(), config.retry_backoff(), MAX_BACKOFF)
    }

    /// Total attempts permitted, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after failed attempt number `attempt` (1-based), or
    /// `None` when the budget is spent.
    #[must_use]
    pub fn delay_before_retry(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = attempt
            .checked_sub(1)
            .and_then(|shift| 1_u32.checked_shl(shift))
            .unwrap_or(u32::MAX);
        Some(self.initial_backoff.saturating_mul(factor).min(self.max_backoff))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
