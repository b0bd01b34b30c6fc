//! Error-handling middleware: retry policy point and failure logging

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, warn};

use taiga_client::{TaigaError, TaigaResult};
use taiga_resilience::{RetryError, RetryExecutor, RetryPolicy, Retryable};

use crate::context::InvocationContext;
use crate::middleware::{Middleware, Next};

/// Outermost layer: enforces the invocation deadline, retries classified
/// transient failures with backoff and jitter, and logs every failure with
/// its correlation id.
///
/// Retries are gated on the idempotency classification: a target without the
/// idempotent hint whose method is not GET/HEAD is never retried.
pub struct ErrorHandlingMiddleware {
    policy: RetryPolicy,
    production: bool,
}

impl ErrorHandlingMiddleware {
    pub fn new(policy: RetryPolicy, production: bool) -> Self {
        Self { policy, production }
    }

    /// A retry is only attempted when its delay fits the remaining deadline
    fn delay_fits_budget(&self, error: &TaigaError, ctx: &InvocationContext) -> bool {
        let delay = error.retry_delay().unwrap_or(self.policy.initial_delay);
        delay < ctx.remaining()
    }
}

/// One failed attempt, carrying the retry decision for the executor
struct Attempt {
    inner: TaigaError,
    retryable: bool,
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl Retryable for Attempt {
    fn is_retryable(&self) -> bool {
        self.retryable
    }

    fn retry_delay(&self) -> Option<Duration> {
        self.inner.retry_delay()
    }
}

#[async_trait]
impl Middleware for ErrorHandlingMiddleware {
    async fn handle(
        &self,
        ctx: &InvocationContext,
        args: &Value,
        next: Next<'_>,
    ) -> TaigaResult<Value> {
        let retry_allowed = ctx.retry_allowed();
        let executor = RetryExecutor::new(self.policy.clone());

        let result = executor
            .execute(|attempt| async move {
                if ctx.is_expired() {
                    return Err(Attempt {
                        inner: TaigaError::Timeout {
                            elapsed: ctx.elapsed(),
                        },
                        retryable: false,
                    });
                }

                if attempt > 1 {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        target = %ctx.target,
                        attempt,
                        "Retrying invocation"
                    );
                }

                match tokio::time::timeout(ctx.remaining(), next.run(ctx, args)).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => {
                        let retryable = retry_allowed
                            && e.is_retryable()
                            && !ctx.is_expired()
                            && self.delay_fits_budget(&e, ctx);
                        Err(Attempt {
                            inner: e,
                            retryable,
                        })
                    }
                    Err(_) => Err(Attempt {
                        inner: TaigaError::Timeout {
                            elapsed: ctx.elapsed(),
                        },
                        retryable: false,
                    }),
                }
            })
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(retry_error) => {
                let (attempts, attempt) = match retry_error {
                    RetryError::MaxAttemptsExceeded {
                        attempts,
                        last_error,
                    } => (attempts, last_error),
                    RetryError::NonRetryableError(e) => (1, e),
                };

                let e = attempt.inner;
                error!(
                    correlation_id = %ctx.correlation_id,
                    kind = %ctx.kind.as_str(),
                    target = %ctx.target,
                    error_kind = e.kind(),
                    attempts,
                    "Invocation failed: {}",
                    e.public_message(self.production)
                );

                Err(e)
            }
        }
    }
}
