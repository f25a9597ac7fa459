// Retry policy for backend calls
// Transient failures are retried a bounded number of times with a fixed delay;
// the policy plugs into `backoff::future::retry_notify`
//
// Numan Thabit 2025 Nov

use backoff::backoff::Backoff;
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn backoff(&self) -> FixedBackoff {
        FixedBackoff {
            policy: *self,
            retries: 0,
        }
    }
}

/// Constant delay that gives up after `max_retries` waits.
#[derive(Debug, Clone)]
pub struct FixedBackoff {
    policy: RetryPolicy,
    retries: u32,
}

impl Backoff for FixedBackoff {
    fn reset(&mut self) {
        self.retries = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.retries >= self.policy.max_retries {
            return None;
        }
        self.retries += 1;
        Some(self.policy.delay)
    }
}

/// Statuses worth another attempt: timeouts, conflicts, throttling and gateway errors.
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status.as_u16(),
        408 | 409 | 425 | 429 | 500 | 502 | 503 | 504
    )
}
