//! Domain-specific configuration modules

pub mod cache;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod rate_limit;
pub mod upstream;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TaigaConfig {
    /// Upstream Taiga API configuration
    #[serde(default)]
    pub upstream: upstream::UpstreamConfig,

    /// HTTP session pool configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Response cache configuration
    #[serde(default)]
    pub cache: cache::CacheConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: rate_limit::RateLimitConfig,

    /// MCP transport configuration
    #[serde(default)]
    pub mcp: mcp::McpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl TaigaConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.upstream.validate()?;
        self.http.validate()?;
        self.cache.validate()?;
        self.rate_limit.validate()?;
        self.mcp.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = TaigaConfig::default();
        serde_yaml::to_string(&config).unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
