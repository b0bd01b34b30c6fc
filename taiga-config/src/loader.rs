//! Configuration loading and environment variable handling

use crate::domains::{logging::LogLevel, mcp::TransportMode, TaigaConfig};
use crate::error::{ConfigError, ConfigResult};

/// Configuration loader with environment variable support
///
/// Recognised keys: `TAIGA_API_URL`, `TAIGA_USERNAME`, `TAIGA_PASSWORD`,
/// `TAIGA_AUTH_TOKEN`, `TAIGA_TIMEOUT`, `TAIGA_MAX_RETRIES`,
/// `TAIGA_CACHE_ENABLED`, `TAIGA_CACHE_TTL`, `TAIGA_CACHE_MAX_SIZE`,
/// `TAIGA_RATE_LIMIT_RPS`, `MCP_TRANSPORT`, `MCP_HOST`, `MCP_PORT`,
/// `MCP_DEBUG`, `TAIGA_ENV`.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from environment variables
    pub fn from_env(&self) -> ConfigResult<TaigaConfig> {
        let mut config = TaigaConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut TaigaConfig) -> ConfigResult<()> {
        self.apply_upstream_overrides(config)?;
        self.apply_cache_overrides(config)?;
        self.apply_rate_limit_overrides(config)?;
        self.apply_mcp_overrides(config)?;
        Ok(())
    }

    fn apply_upstream_overrides(&self, config: &mut TaigaConfig) -> ConfigResult<()> {
        config.upstream.base_url = get_env("TAIGA_API_URL")
            .ok_or_else(|| ConfigError::MissingRequired("TAIGA_API_URL".to_string()))?;

        if let Some(username) = get_env("TAIGA_USERNAME") {
            config.upstream.username = Some(username);
        }
        if let Some(password) = get_env("TAIGA_PASSWORD") {
            config.upstream.password = Some(password);
        }
        if let Some(token) = get_env("TAIGA_AUTH_TOKEN") {
            config.upstream.auth_token = Some(token);
        }

        if let Some(timeout) = get_env("TAIGA_TIMEOUT") {
            let seconds: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid TAIGA_TIMEOUT: {}", e)))?;
            config.upstream.request_timeout = std::time::Duration::from_secs(seconds);
        }

        if let Some(retries) = get_env("TAIGA_MAX_RETRIES") {
            config.upstream.max_retries = retries
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid TAIGA_MAX_RETRIES: {}", e)))?;
        }

        if let Some(env) = get_env("TAIGA_ENV") {
            config.upstream.production = env.eq_ignore_ascii_case("production");
        }

        Ok(())
    }

    fn apply_cache_overrides(&self, config: &mut TaigaConfig) -> ConfigResult<()> {
        if let Some(enabled) = get_env("TAIGA_CACHE_ENABLED") {
            config.cache.enabled = parse_bool(&enabled)
                .ok_or_else(|| ConfigError::EnvError(format!("Invalid TAIGA_CACHE_ENABLED: {}", enabled)))?;
        }

        if let Some(ttl) = get_env("TAIGA_CACHE_TTL") {
            let seconds: u64 = ttl
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid TAIGA_CACHE_TTL: {}", e)))?;
            config.cache.default_ttl = std::time::Duration::from_secs(seconds);
        }

        if let Some(size) = get_env("TAIGA_CACHE_MAX_SIZE") {
            config.cache.max_entries = size
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid TAIGA_CACHE_MAX_SIZE: {}", e)))?;
        }

        Ok(())
    }

    fn apply_rate_limit_overrides(&self, config: &mut TaigaConfig) -> ConfigResult<()> {
        if let Some(rps) = get_env("TAIGA_RATE_LIMIT_RPS") {
            config.rate_limit.requests_per_second = rps
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid TAIGA_RATE_LIMIT_RPS: {}", e)))?;
        }
        Ok(())
    }

    fn apply_mcp_overrides(&self, config: &mut TaigaConfig) -> ConfigResult<()> {
        if let Some(transport) = get_env("MCP_TRANSPORT") {
            config.mcp.transport = transport
                .parse::<TransportMode>()
                .map_err(ConfigError::EnvError)?;
        }

        if let Some(host) = get_env("MCP_HOST") {
            config.mcp.host = host;
        }

        if let Some(port) = get_env("MCP_PORT") {
            config.mcp.port = port
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid MCP_PORT: {}", e)))?;
        }

        if let Some(debug) = get_env("MCP_DEBUG") {
            if parse_bool(&debug).unwrap_or(false) {
                config.logging.level = LogLevel::Debug;
            }
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn get_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
