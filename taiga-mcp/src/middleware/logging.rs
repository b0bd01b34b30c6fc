//! Structured request logging with secret redaction

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use taiga_client::TaigaResult;

use crate::context::InvocationContext;
use crate::middleware::{Middleware, Next};

/// Argument keys whose values never reach a log record
const SENSITIVE_KEYS: &[&str] = &["password", "token", "secret", "authorization", "api_key", "refresh"];

/// Replace sensitive values in an argument object before logging
pub fn sanitize_arguments(args: &Value) -> Value {
    match args {
        Value::Object(map) => {
            let sanitized = map
                .iter()
                .map(|(key, value)| {
                    let lowered = key.to_lowercase();
                    if SENSITIVE_KEYS.iter().any(|s| lowered.contains(s)) {
                        (key.clone(), Value::String("[redacted]".to_string()))
                    } else {
                        (key.clone(), sanitize_arguments(value))
                    }
                })
                .collect();
            Value::Object(sanitized)
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize_arguments).collect()),
        other => other.clone(),
    }
}

/// Innermost layer: one start record and one end record per invocation with
/// correlation id, kind, target, duration, outcome and a sanitised argument
/// summary.
pub struct RequestLoggingMiddleware;

#[async_trait]
impl Middleware for RequestLoggingMiddleware {
    async fn handle(
        &self,
        ctx: &InvocationContext,
        args: &Value,
        next: Next<'_>,
    ) -> TaigaResult<Value> {
        info!(
            correlation_id = %ctx.correlation_id,
            kind = ctx.kind.as_str(),
            target = %ctx.target,
            arguments = %sanitize_arguments(args),
            "Invocation started"
        );

        let result = next.run(ctx, args).await;

        let outcome = match &result {
            Ok(_) => "ok".to_string(),
            Err(e) => e.kind().to_string(),
        };

        info!(
            correlation_id = %ctx.correlation_id,
            kind = ctx.kind.as_str(),
            target = %ctx.target,
            duration_ms = ctx.elapsed().as_millis() as u64,
            outcome = %outcome,
            "Invocation finished"
        );

        result
    }
}

/// A sanitised one-line summary for embedding in other records
pub fn argument_summary(args: &Value) -> String {
    let sanitized = sanitize_arguments(args);
    match sanitized {
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        other => serde_json::to_string(&other).unwrap_or_else(|_| json!({}).to_string()),
    }
}
