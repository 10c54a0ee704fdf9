//! Retry policy and the backoff loop driven by the client facade
//!
//! Interceptors may only *signal* that a response deserves another attempt.
//! Re-sending, and waiting between attempts, happens here on the async
//! runtime so no worker thread is ever parked.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{config::duration_ms, error::ClientError, Result};

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retries after the first attempt (0 = never retry)
    #[serde(default)]
    pub max_retries: u32,
    /// Delay before the first retry
    #[serde(default = "default_initial_delay", with = "duration_ms")]
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    #[serde(default = "default_max_delay", with = "duration_ms")]
    pub max_delay: Duration,
    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self::default()
    }

    /// Exponential backoff with the given retry budget
    pub fn exponential(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            ..Default::default()
        }
    }

    /// Calculate delay for given attempt number
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);

        let delay = Duration::from_millis(delay_ms as u64);
        std::cmp::min(delay, self.max_delay)
    }
}

/// Failure of a single attempt, tagged with whether a retry may help
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptError {
    pub error: ClientError,
    pub retry: bool,
}

impl AttemptError {
    /// Failure that another attempt cannot fix
    pub fn fatal(error: ClientError) -> Self {
        Self {
            error,
            retry: false,
        }
    }

    /// Failure the loop may retry if budget remains
    pub fn retryable(error: ClientError) -> Self {
        Self { error, retry: true }
    }
}

impl From<ClientError> for AttemptError {
    fn from(error: ClientError) -> Self {
        let retry = error.is_retryable();
        Self { error, retry }
    }
}

/// Runs an operation until it succeeds, fails fatally or exhausts the policy
#[derive(Debug, Clone)]
pub struct RetryMiddleware {
    policy: RetryPolicy,
}

impl RetryMiddleware {
    /// Create new retry middleware
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute operation with retry logic.
    ///
    /// The closure receives the zero-based attempt number. When retries are
    /// exhausted the last attempt's error is returned unchanged.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn(u32) -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, AttemptError>>,
    {
        let mut attempt = 0;
        loop {
            match operation(attempt).await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!("Request succeeded after {attempt} retries");
                    }
                    return Ok(result);
                }
                Err(AttemptError { error, retry }) => {
                    if !retry {
                        debug!("Non-retryable error: {error}");
                        return Err(error);
                    }

                    if attempt >= self.policy.max_retries {
                        if self.policy.max_retries > 0 {
                            warn!(
                                "Giving up after {} attempts: {}",
                                attempt + 1,
                                error
                            );
                        }
                        return Err(error);
                    }

                    let delay = self.policy.calculate_delay(attempt);
                    warn!(
                        "Request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.policy.max_retries + 1,
                        delay,
                        error
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_retry_policy_delay_calculation() {
        let policy = RetryPolicy::exponential(3, Duration::from_millis(500));

        // Attempt 0: 500ms
        assert_eq!(policy.calculate_delay(0), Duration::from_millis(500));

        // Attempt 1: 1000ms (500 * 2^1)
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(1000));

        // Attempt 2: 2000ms (500 * 2^2)
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = RetryPolicy {
            max_delay: Duration::from_secs(5),
            ..Default::default()
        };

        assert!(policy.calculate_delay(10) <= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let middleware = RetryMiddleware::new(RetryPolicy::exponential(3, Duration::from_millis(1)));

        let result = middleware
            .execute(|_| async { Ok::<_, AttemptError>(42) })
            .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_second_attempt() {
        let middleware = RetryMiddleware::new(RetryPolicy::exponential(2, Duration::from_millis(10)));

        let result = middleware
            .execute(|attempt| async move {
                if attempt == 0 {
                    Err(AttemptError::retryable(ClientError::StatusCode(503)))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let middleware = RetryMiddleware::new(RetryPolicy::exponential(2, Duration::from_millis(10)));

        let result = middleware
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<i32, _>(AttemptError::retryable(ClientError::StatusCode(502))) }
            })
            .await;

        assert_eq!(result, Err(ClientError::StatusCode(502)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_short_circuits() {
        let calls = AtomicU32::new(0);
        let middleware = RetryMiddleware::new(RetryPolicy::exponential(5, Duration::from_millis(1)));

        let result = middleware
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<i32, _>(AttemptError::fatal(ClientError::InvalidUrl("bad".to_string()))) }
            })
            .await;

        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_never_retries() {
        let calls = AtomicU32::new(0);
        let middleware = RetryMiddleware::new(RetryPolicy::none());

        let result = middleware
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<i32, _>(ClientError::NetworkError("reset".to_string()).into()) }
            })
            .await;

        assert!(matches!(result, Err(ClientError::NetworkError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
