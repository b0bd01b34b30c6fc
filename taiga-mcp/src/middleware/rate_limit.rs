//! Rate-limiting middleware: one process-wide token bucket

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use taiga_client::{TaigaError, TaigaResult};

use crate::context::InvocationContext;
use crate::middleware::{Middleware, Next};

/// Token bucket for rate limiting
///
/// Invariant: `0 <= tokens <= capacity` after every operation.
pub struct TokenBucket {
    capacity: f64,
    refill_rate: f64,
    // tokio's Mutex would suspend; this critical section is tiny
    state: parking_lot::Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Bucket refilling at `requests_per_second` with `burst` capacity
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        Self {
            capacity: burst as f64,
            refill_rate: requests_per_second,
            state: parking_lot::Mutex::new(BucketState {
                tokens: burst as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token if available
    pub fn try_consume(&self) -> bool {
        let mut state = self.state.lock();
        Self::refill(&mut state, self.capacity, self.refill_rate);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until one token becomes available
    pub fn time_until_available(&self) -> Duration {
        let mut state = self.state.lock();
        Self::refill(&mut state, self.capacity, self.refill_rate);

        if state.tokens >= 1.0 {
            Duration::ZERO
        } else {
            let needed = 1.0 - state.tokens;
            Duration::from_secs_f64(needed / self.refill_rate)
        }
    }

    /// Remaining tokens (for tests and metrics)
    pub fn remaining(&self) -> f64 {
        let mut state = self.state.lock();
        Self::refill(&mut state, self.capacity, self.refill_rate);
        state.tokens
    }

    /// Wait for a token, bounded by the invocation deadline
    pub async fn acquire(&self, deadline: Instant) -> TaigaResult<()> {
        loop {
            if self.try_consume() {
                return Ok(());
            }

            let wait = self.time_until_available();
            if Instant::now() + wait > deadline {
                return Err(TaigaError::RateLimited {
                    retry_after: None,
                    upstream: false,
                });
            }

            tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
        }
    }

    fn refill(state: &mut BucketState, capacity: f64, refill_rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();

        state.tokens = (state.tokens + elapsed * refill_rate).min(capacity);
        state.last_refill = now;
    }
}

/// Gate every invocation on the shared bucket. Read-only targets do not
/// bypass the limit.
pub struct RateLimitMiddleware {
    bucket: Arc<TokenBucket>,
}

impl RateLimitMiddleware {
    pub fn new(bucket: Arc<TokenBucket>) -> Self {
        Self { bucket }
    }
}

#[async_trait]
impl Middleware for RateLimitMiddleware {
    async fn handle(
        &self,
        ctx: &InvocationContext,
        args: &Value,
        next: Next<'_>,
    ) -> TaigaResult<Value> {
        if let Err(e) = self.bucket.acquire(ctx.deadline).await {
            debug!(
                correlation_id = %ctx.correlation_id,
                target = %ctx.target,
                "Rate limit deadline exceeded"
            );
            return Err(e);
        }

        next.run(ctx, args).await
    }
}
