//! Domain-driven configuration for the Taiga MCP server
//!
//! This crate provides modular configuration split by functional domains,
//! with validation, defaults, and environment variable support.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    cache::CacheConfig, http::ConnectionPoolConfig, http::HttpConfig, logging::LogLevel,
    logging::LoggingConfig, mcp::McpConfig, mcp::TransportMode, rate_limit::RateLimitConfig,
    upstream::UpstreamConfig, TaigaConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
pub use validation::Validatable;
