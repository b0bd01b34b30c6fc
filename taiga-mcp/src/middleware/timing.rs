//! Timing middleware

use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;
use tracing::trace;

use taiga_client::TaigaResult;

use crate::context::InvocationContext;
use crate::middleware::{Middleware, Next};

/// Measures the inner chain and attaches the duration to the trace context.
/// Never fails an invocation on its own.
pub struct TimingMiddleware;

#[async_trait]
impl Middleware for TimingMiddleware {
    async fn handle(
        &self,
        ctx: &InvocationContext,
        args: &Value,
        next: Next<'_>,
    ) -> TaigaResult<Value> {
        let start = Instant::now();
        let result = next.run(ctx, args).await;
        let duration = start.elapsed();

        trace!(
            correlation_id = %ctx.correlation_id,
            target = %ctx.target,
            duration_ms = duration.as_millis() as u64,
            "Invocation timed"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InvocationKind;
    use crate::middleware::{EndpointFuture, MiddlewareChain};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_timing_passes_results_and_errors_through() {
        let chain = MiddlewareChain::new(vec![Arc::new(TimingMiddleware)]);
        let ctx = InvocationContext::new(InvocationKind::Tool, "t", Duration::from_secs(5));

        let ok_endpoint = || -> EndpointFuture { Box::pin(async { Ok(json!(7)) }) };
        assert_eq!(chain.dispatch(&ctx, &json!({}), &ok_endpoint).await.unwrap(), json!(7));

        let err_endpoint = || -> EndpointFuture {
            Box::pin(async { Err(taiga_client::TaigaError::not_found("x")) })
        };
        assert!(chain.dispatch(&ctx, &json!({}), &err_endpoint).await.is_err());
    }
}
