//! Retry policy and executor

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::backoff::equal_jitter;

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Initial delay between retries
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    /// Backoff strategy
    pub backoff_strategy: crate::backoff::BackoffStrategy,

    /// Whether to add jitter to retry delays
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_strategy: crate::backoff::BackoffStrategy::Exponential { base: 2.0 },
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy issuing `retries` retries after the first attempt
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Default::default()
        }
    }

    /// Calculate delay for a specific attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .backoff_strategy
            .delay(attempt, self.initial_delay, self.max_delay);

        if self.jitter {
            equal_jitter(delay)
        } else {
            delay
        }
    }
}

/// Trait for errors that can be retried
pub trait Retryable {
    /// Whether this error is retryable
    fn is_retryable(&self) -> bool;

    /// Custom retry delay for this error type (e.g. an upstream Retry-After)
    fn retry_delay(&self) -> Option<Duration> {
        None
    }
}

/// Retry executor
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create a new retry executor with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Execute a function with retry logic
    pub async fn execute<F, Fut, T, E>(&self, mut f: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let mut attempt = 1;

        loop {
            debug!("Executing attempt {} of {}", attempt, self.policy.max_attempts);

            match f(attempt).await {
                Ok(result) => {
                    if attempt > 1 {
                        info!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_retryable() {
                        return Err(RetryError::NonRetryableError(error));
                    }

                    if attempt >= self.policy.max_attempts {
                        warn!("Operation failed after {} attempts: {}", attempt, error);
                        return Err(RetryError::MaxAttemptsExceeded {
                            attempts: attempt,
                            last_error: error,
                        });
                    }

                    let delay = error
                        .retry_delay()
                        .unwrap_or_else(|| self.policy.delay_for_attempt(attempt));

                    warn!("Attempt {} failed: {}. Retrying in {:?}", attempt, error, delay);
                    sleep(delay).await;

                    attempt += 1;
                }
            }
        }
    }
}

/// Retry error types
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts ({attempts}) exceeded. Last error: {last_error}")]
    MaxAttemptsExceeded { attempts: u32, last_error: E },

    /// Non-retryable error encountered
    #[error("Non-retryable error: {0}")]
    NonRetryableError(E),
}

impl<E> RetryError<E> {
    /// Get the underlying error
    pub fn into_inner(self) -> E {
        match self {
            RetryError::MaxAttemptsExceeded { last_error, .. } => last_error,
            RetryError::NonRetryableError(error) => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
        message: String,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            backoff_strategy: crate::backoff::BackoffStrategy::Fixed,
            jitter: false,
        }
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let executor = RetryExecutor::new(fast_policy(3));

        let result = executor
            .execute(|_attempt| {
                let count = counter_clone.fetch_add(1, Ordering::Relaxed);
                async move {
                    if count < 2 {
                        Err(TestError {
                            retryable: true,
                            message: "Temporary failure".to_string(),
                        })
                    } else {
                        Ok("Success".to_string())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Success");
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_retry_max_attempts_exceeded() {
        let executor = RetryExecutor::new(fast_policy(2));

        let result: Result<(), RetryError<TestError>> = executor
            .execute(|_| async {
                Err(TestError {
                    retryable: true,
                    message: "Always fails".to_string(),
                })
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            RetryError::MaxAttemptsExceeded { attempts: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_non_retryable_error() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let executor = RetryExecutor::new(fast_policy(5));

        let result: Result<(), RetryError<TestError>> = executor
            .execute(|_| {
                attempts_clone.fetch_add(1, Ordering::Relaxed);
                async {
                    Err(TestError {
                        retryable: false,
                        message: "Non-retryable".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result.unwrap_err(), RetryError::NonRetryableError(_)));
        // No second attempt for a non-retryable error
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let executor = RetryExecutor::new(fast_policy(1));

        let result: Result<(), RetryError<TestError>> = executor
            .execute(|_| async {
                Err(TestError {
                    retryable: true,
                    message: "fails".to_string(),
                })
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            RetryError::MaxAttemptsExceeded { attempts: 1, .. }
        ));
    }
}
