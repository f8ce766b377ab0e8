//! Bounded exponential back-off for webhook delivery.
//!
//! [`retry_with_backoff`] retries any failed attempt (transport errors and
//! non-2xx statuses alike) until the attempt budget is spent, then returns
//! the last error. A malformed webhook URL is the only hard stop.

use std::future::Future;
use std::time::Duration;

use sigtrack_core::AppConfig;

use crate::error::SlackError;

/// How many times to attempt delivery and how long to wait in between.
///
/// The wait before attempt `n + 1` is `initial_delay * 2^(n - 1)`, capped at
/// `max_delay`. With the defaults (3 attempts, 2 s, 10 s cap) the schedule is
/// 2 s then 4 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.slack_max_attempts,
            Duration::from_millis(config.slack_backoff_initial_ms),
            Duration::from_millis(config.slack_backoff_max_ms),
        )
    }

    /// Delay slept after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        self.initial_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }

    /// Every delay that can be slept before the final attempt, in order.
    #[must_use]
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts).map(|a| self.delay_after(a)).collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2), Duration::from_secs(10))
    }
}

pub(crate) fn is_retriable(err: &SlackError) -> bool {
    match err {
        SlackError::Http(_) => true,
        SlackError::InvalidUrl(_) => false,
    }
}

/// Run `operation` until it succeeds or `policy.max_attempts` is reached.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, SlackError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SlackError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_attempts {
                    return Err(err);
                }
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "webhook delivery failed; retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
