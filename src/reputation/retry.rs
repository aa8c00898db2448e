//! Per-attempt timeout with at most one bounded retry.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::constants::{DEFAULT_RETRY_BACKOFF, MAX_FETCH_RETRIES};

use super::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one (0 or 1).
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_FETCH_RETRIES,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Runs `operation` with `timeout` per attempt.
    ///
    /// Returns the final result and the number of attempts made. Only
    /// [`FetchError::is_retryable`] failures are retried.
    pub async fn run<F, Fut, T>(&self, timeout: Duration, mut operation: F) -> (Result<T, FetchError>, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let result = match tokio::time::timeout(timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout),
            };

            match result {
                Ok(value) => return (Ok(value), attempt),
                Err(e) if e.is_retryable() && attempt <= self.max_retries => {
                    debug!(
                        attempt,
                        error = %e,
                        backoff_ms = self.backoff.as_millis() as u64,
                        "Fetch failed, retrying after backoff"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }
}
