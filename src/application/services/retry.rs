//! Per-probe retry policy with exponential backoff.

use std::time::Duration;

/// How often, and how patiently, a transient probe failure is retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub backoff_base: Duration,
    /// Growth factor applied to each following delay.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_retries: u32, backoff_base: Duration, multiplier: f64) -> Self {
        Self {
            max_retries,
            backoff_base,
            multiplier,
        }
    }

    /// Single attempt, never retried.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO, 1.0)
    }

    /// Total number of attempts this policy allows.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (zero-based): `base * multiplier^retry`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let factor = self.multiplier.max(1.0).powi(exponent);
        let nanos = (self.backoff_base.as_nanos() as f64 * factor).round();
        if nanos >= u64::MAX as f64 {
            Duration::MAX
        } else {
            Duration::from_nanos(nanos as u64)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_millis(400), 1.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_geometrically() {
        let policy = RetryPolicy::new(3, Duration::from_millis(400), 1.5);
        assert_eq!(policy.delay_for(0), Duration::from_millis(400));
        assert_eq!(policy.delay_for(1), Duration::from_millis(600));
        assert_eq!(policy.delay_for(2), Duration::from_millis(900));
    }

    #[test]
    fn test_multiplier_below_one_does_not_shrink() {
        let policy = RetryPolicy::new(2, Duration::from_millis(300), 0.5);
        assert_eq!(policy.delay_for(1), Duration::from_millis(300));
    }

    #[test]
    fn test_max_attempts() {
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
        assert_eq!(RetryPolicy::default().max_attempts(), 2);
    }
}
