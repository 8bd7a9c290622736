//! Bounded exponential backoff.
//!
//! One [`Backoff`] instance tracks one operation's retry budget: the delay
//! doubles from `initial_backoff` up to `max_backoff`, and `next_delay`
//! returns `None` once `max_attempts` total attempts have been spent.

use std::time::Duration;

use openescrow_types::RetryConfig;

/// Retry budget for a single operation.
#[derive(Debug)]
pub struct Backoff {
    config: RetryConfig,
    retries: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config, retries: 0 }
    }

    /// Delay before the next retry, or `None` when the budget is spent.
    ///
    /// Call after each failed attempt; the first call corresponds to the
    /// first retry (attempt number two).
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.retries + 1 >= self.config.max_attempts {
            return None;
        }
        // Shift capped well below u32 range; max_backoff clamps the result.
        let factor = 1u32 << self.retries.min(20);
        let delay = self
            .config
            .initial_backoff
            .saturating_mul(factor)
            .min(self.config.max_backoff);
        self.retries += 1;
        Some(delay)
    }

    /// Attempts consumed so far, counting the initial one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_attempts: u32, initial_ms: u64, max_ms: u64) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_backoff: Duration::from_millis(initial_ms),
            max_backoff: Duration::from_millis(max_ms),
        }
    }

    #[test]
    fn delays_double_until_exhausted() {
        let mut backoff = Backoff::new(config(5, 100, 60_000));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(400)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(800)));
        assert_eq!(backoff.next_delay(), None, "five attempts spent");
        assert_eq!(backoff.attempts(), 5);
    }

    #[test]
    fn ceiling_is_respected() {
        let mut backoff = Backoff::new(config(5, 100, 250));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(250)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn single_attempt_budget_never_retries() {
        let mut backoff = Backoff::new(config(1, 100, 1000));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.attempts(), 1);
    }

    #[test]
    fn large_retry_counts_do_not_overflow() {
        let mut backoff = Backoff::new(config(64, 1, 5));
        let mut last = Duration::ZERO;
        while let Some(delay) = backoff.next_delay() {
            last = delay;
        }
        assert_eq!(last, Duration::from_millis(5));
        assert_eq!(backoff.attempts(), 64);
    }
}
