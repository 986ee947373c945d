use std::time::Duration;

use papernet_config::PollingConfig;

/// Bounded exponential backoff for failed status requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Give up on the first failure.
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    pub fn from_config(polling: &PollingConfig) -> Self {
        Self {
            max_attempts: polling.retry_max_attempts.max(1),
            initial_backoff: polling.initial_backoff(),
            max_backoff: polling.max_backoff(),
            multiplier: polling.retry_multiplier.max(1.0),
        }
    }

    /// Whether another request is allowed after `failures` consecutive failures.
    pub fn should_retry(&self, failures: u32) -> bool {
        failures < self.max_attempts
    }

    /// Delay after the `failures`-th consecutive failure (1-based).
    pub fn backoff(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let nanos = self.initial_backoff.as_nanos() as f64 * self.multiplier.powi(exp);
        if !nanos.is_finite() || nanos >= self.max_backoff.as_nanos() as f64 {
            self.max_backoff
        } else {
            Duration::from_nanos(nanos.round() as u64)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}
