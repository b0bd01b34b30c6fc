//! Middleware stack wrapping every invocation
//!
//! One ordered chain runs outermost-to-innermost on entry and unwinds in
//! reverse: error handling (with retries), rate limiting, timing, request
//! logging. `Next` is `Copy`, so the error layer can re-run the inner part
//! of the chain when a transient failure is retryable.

pub mod error_handler;
pub mod logging;
pub mod rate_limit;
pub mod timing;

pub use error_handler::ErrorHandlingMiddleware;
pub use logging::{sanitize_arguments, RequestLoggingMiddleware};
pub use rate_limit::{RateLimitMiddleware, TokenBucket};
pub use timing::TimingMiddleware;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

use taiga_client::TaigaResult;

use crate::context::InvocationContext;

/// Future produced by the innermost handler
pub type EndpointFuture = BoxFuture<'static, TaigaResult<Value>>;

/// The innermost handler: each call produces a fresh attempt
pub type Endpoint = dyn Fn() -> EndpointFuture + Send + Sync;

/// One layer of the chain
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(
        &self,
        ctx: &InvocationContext,
        args: &Value,
        next: Next<'_>,
    ) -> TaigaResult<Value>;
}

/// The remainder of the chain from one layer's point of view
#[derive(Clone, Copy)]
pub struct Next<'a> {
    rest: &'a [Arc<dyn Middleware>],
    endpoint: &'a Endpoint,
}

impl<'a> Next<'a> {
    /// Run the rest of the chain down to the endpoint
    pub async fn run(self, ctx: &InvocationContext, args: &Value) -> TaigaResult<Value> {
        match self.rest.split_first() {
            Some((middleware, rest)) => {
                middleware
                    .handle(
                        ctx,
                        args,
                        Next {
                            rest,
                            endpoint: self.endpoint,
                        },
                    )
                    .await
            }
            None => (self.endpoint)().await,
        }
    }
}

/// The composed, ordered chain
pub struct MiddlewareChain {
    stack: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Compose a chain; `stack[0]` is outermost
    pub fn new(stack: Vec<Arc<dyn Middleware>>) -> Self {
        Self { stack }
    }

    /// Dispatch one invocation through the chain
    pub async fn dispatch(
        &self,
        ctx: &InvocationContext,
        args: &Value,
        endpoint: &Endpoint,
    ) -> TaigaResult<Value> {
        Next {
            rest: &self.stack,
            endpoint,
        }
        .run(ctx, args)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InvocationKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct Recorder {
        label: &'static str,
        order: Arc<std::sync::Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Middleware for Recorder {
        async fn handle(
            &self,
            ctx: &InvocationContext,
            args: &Value,
            next: Next<'_>,
        ) -> TaigaResult<Value> {
            self.order.lock().unwrap().push(self.label);
            let result = next.run(ctx, args).await;
            self.order.lock().unwrap().push(self.label);
            result
        }
    }

    #[tokio::test]
    async fn test_chain_runs_outermost_to_innermost() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let chain = MiddlewareChain::new(vec![
            Arc::new(Recorder {
                label: "outer",
                order: order.clone(),
            }),
            Arc::new(Recorder {
                label: "inner",
                order: order.clone(),
            }),
        ]);

        let ctx = InvocationContext::new(InvocationKind::Tool, "t", Duration::from_secs(5));
        let endpoint = || -> EndpointFuture { Box::pin(async { Ok(json!(1)) }) };

        let result = chain.dispatch(&ctx, &json!({}), &endpoint).await.unwrap();
        assert_eq!(result, json!(1));

        // Entry outermost-first, exit innermost-first
        assert_eq!(
            *order.lock().unwrap(),
            vec!["outer", "inner", "inner", "outer"]
        );
    }

    #[tokio::test]
    async fn test_empty_chain_calls_endpoint() {
        let chain = MiddlewareChain::new(vec![]);
        let ctx = InvocationContext::new(InvocationKind::Tool, "t", Duration::from_secs(5));

        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let endpoint = move || -> EndpointFuture {
            calls_clone.fetch_add(1, Ordering::Relaxed);
            Box::pin(async { Ok(json!("done")) })
        };

        let result = chain.dispatch(&ctx, &json!({}), &endpoint).await.unwrap();
        assert_eq!(result, json!("done"));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
