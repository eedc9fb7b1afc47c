//! Retry policy
//!
//! A request is attempted at most `max_retries + 1` times. Before attempt
//! `n` (n >= 1) the client sleeps `retry_delay * 2^(n-1) * (1 + jitter)`
//! with jitter drawn uniformly from `[0, 0.3)`. Client errors other than
//! 408 and 429 are never retried, whatever `retryable_statuses` says.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::RngExt;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_RETRYABLE_STATUSES: &[u16] = &[408, 429, 500, 502, 503, 504];

/// Upper bound (exclusive) of the multiplicative jitter.
pub const MAX_JITTER: f64 = 0.3;

/// Why an attempt failed, as seen by the retry predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryCause {
    /// No response was received.
    Network(String),
    /// The server answered with this status.
    Status(u16),
}

/// Extra veto over retries: `(cause, attempt) -> retry?`. `attempt` is
/// zero-based.
pub type RetryPredicate = Arc<dyn Fn(&RetryCause, u32) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub retryable_statuses: Vec<u16>,
    should_retry: RetryPredicate,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
            should_retry: Arc::new(|_, _| true),
        }
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("retryable_statuses", &self.retryable_statuses)
            .finish_non_exhaustive()
    }
}

impl RetryConfig {
    /// A policy that performs a single attempt.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_retryable_statuses(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.retryable_statuses = statuses.into();
        self
    }

    pub fn with_should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RetryCause, u32) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Total number of attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether a response with `status` on zero-based `attempt` qualifies for
    /// another attempt. Does not look at the attempt budget.
    pub fn should_retry_status(&self, status: u16, attempt: u32) -> bool {
        is_retryable_status(status, &self.retryable_statuses)
            && (self.should_retry)(&RetryCause::Status(status), attempt)
    }

    /// Network failures are retryable unless the predicate vetoes them.
    pub fn should_retry_network(&self, cause: &str, attempt: u32) -> bool {
        (self.should_retry)(&RetryCause::Network(cause.to_string()), attempt)
    }

    /// Jittered delay before `attempt`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let jitter = rand::rng().random_range(0.0..MAX_JITTER);
        backoff_delay(self.retry_delay, attempt, jitter)
    }
}

/// Status classification shared by every policy.
pub fn is_retryable_status(status: u16, retryable: &[u16]) -> bool {
    let client_error = (400..500).contains(&status) && status != 408 && status != 429;
    let success = (200..300).contains(&status);
    !client_error && !success && retryable.contains(&status)
}

/// `base * 2^(attempt-1) * (1 + jitter)`; zero for the first attempt.
pub fn backoff_delay(base: Duration, attempt: u32, jitter: f64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
    let factor = 2f64.powi(exponent) * (1.0 + jitter.clamp(0.0, MAX_JITTER));
    Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}
