//! Cache error types

use thiserror::Error;

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Cache-related errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// Invalid invalidation pattern
    #[error("Invalid invalidation pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Invalid configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfiguration(String),
}
