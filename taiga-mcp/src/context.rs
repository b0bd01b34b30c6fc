//! Per-invocation request context

use std::time::{Duration, Instant};
use uuid::Uuid;

/// What kind of registry target an invocation addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    Tool,
    Resource,
    Prompt,
}

impl InvocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationKind::Tool => "tool",
            InvocationKind::Resource => "resource",
            InvocationKind::Prompt => "prompt",
        }
    }
}

/// Context created per invocation and threaded through the middleware chain
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Operation kind
    pub kind: InvocationKind,

    /// Target name (tool name, resource URI, prompt name)
    pub target: String,

    /// Correlation id attached to every log record of this invocation
    pub correlation_id: String,

    /// Invocation start
    pub started_at: Instant,

    /// Absolute deadline derived from the request timeout
    pub deadline: Instant,

    /// The target carries the read-only hint
    pub read_only: bool,

    /// The target carries the idempotent hint
    pub idempotent: bool,

    /// The underlying HTTP method is safe (GET/HEAD)
    pub safe_method: bool,
}

impl InvocationContext {
    /// Create a context with a fresh correlation id
    pub fn new(kind: InvocationKind, target: impl Into<String>, timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            kind,
            target: target.into(),
            correlation_id: format!("req-{}", Uuid::new_v4()),
            started_at: now,
            deadline: now + timeout,
            read_only: false,
            idempotent: false,
            safe_method: false,
        }
    }

    /// Set the hint flags gating retries
    pub fn with_hints(mut self, read_only: bool, idempotent: bool, safe_method: bool) -> Self {
        self.read_only = read_only;
        self.idempotent = idempotent;
        self.safe_method = safe_method;
        self
    }

    /// Time left until the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Elapsed time since the invocation started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Whether the error middleware may retry a transient failure
    pub fn retry_allowed(&self) -> bool {
        self.idempotent || self.safe_method
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_has_budget() {
        let ctx = InvocationContext::new(InvocationKind::Tool, "taiga_list_projects", Duration::from_secs(30));
        assert!(!ctx.is_expired());
        assert!(ctx.remaining() > Duration::from_secs(29));
        assert!(ctx.correlation_id.starts_with("req-"));
    }

    #[test]
    fn test_zero_timeout_is_expired() {
        let ctx = InvocationContext::new(InvocationKind::Tool, "x", Duration::ZERO);
        assert!(ctx.is_expired());
    }

    #[test]
    fn test_retry_gate() {
        let ctx = InvocationContext::new(InvocationKind::Tool, "x", Duration::from_secs(1));
        assert!(!ctx.retry_allowed());

        let safe = ctx.clone().with_hints(true, false, true);
        assert!(safe.retry_allowed());

        let idempotent = ctx.with_hints(false, true, false);
        assert!(idempotent.retry_allowed());
    }

    #[test]
    fn test_correlation_ids_are_unique() {
        let a = InvocationContext::new(InvocationKind::Prompt, "x", Duration::from_secs(1));
        let b = InvocationContext::new(InvocationKind::Prompt, "x", Duration::from_secs(1));
        assert_ne!(a.correlation_id, b.correlation_id);
    }
}
