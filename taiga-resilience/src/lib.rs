//! Resilience patterns for the Taiga MCP server
//!
//! This crate provides retry policies with backoff and jitter, and graceful
//! shutdown coordination for the request pipeline.

pub mod backoff;
pub mod retry;
pub mod shutdown;

// Re-export commonly used types
pub use backoff::{equal_jitter, BackoffStrategy};
pub use retry::{RetryError, RetryExecutor, RetryPolicy, Retryable};
pub use shutdown::{ShutdownCoordinator, ShutdownError, ShutdownSignal};
