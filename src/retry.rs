//! Retry with exponential backoff at the object-store boundary
//!
//! The transform core never retries. Only the storage adapter wraps its
//! calls in [`RetryPolicy::run`], and only failures it marks retriable
//! (5xx responses and transport errors) are attempted again.
//!
//! Delays grow as `initial_backoff_ms * 2^(attempt-1)`, capped at
//! `max_backoff_ms`:
//! - Attempt 1: immediate
//! - Attempt 2: 100ms
//! - Attempt 3: 200ms
//!
//! ```yaml
//! storage:
//!   retry:
//!     max_attempts: 3
//!     initial_backoff_ms: 100
//!     max_backoff_ms: 1000
//! ```

use std::future::Future;
use std::time::Duration;

use crate::constants::{DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_MS};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Initial backoff delay in milliseconds
    pub initial_backoff_ms: u64,
    /// Maximum backoff delay in milliseconds (cap for exponential growth)
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// Check if an HTTP status code should be retried
    pub fn is_retriable_status(status_code: u16) -> bool {
        matches!(status_code, 500 | 502 | 503 | 504)
    }

    /// Delay before attempt `attempt` (0-indexed; 0 means no delay)
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt - 1))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    /// Whether another attempt is allowed after attempt `attempt` failed
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts.max(1)
    }

    /// Run `operation` until it succeeds, fails with a non-retriable error,
    /// or the attempts run out. The last error is returned.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation_name: &str,
        is_retriable: impl Fn(&E) -> bool,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if is_retriable(&err) && self.has_attempts_left(attempt) => {
                    attempt += 1;
                    let delay = self.backoff_duration(attempt);
                    tracing::warn!(
                        operation = operation_name,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying object store operation"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
