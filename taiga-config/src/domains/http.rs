//! HTTP session pool configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether to verify SSL certificates
    #[serde(default = "crate::domains::utils::default_true")]
    pub verify_ssl: bool,

    /// Connection pool configuration
    #[serde(default)]
    pub connection_pool: ConnectionPoolConfig,
}

/// Connection pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionPoolConfig {
    /// Maximum idle connections per host
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,

    /// Idle connection timeout
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_idle_timeout"
    )]
    pub idle_timeout: Duration,

    /// Connection timeout
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_connection_timeout"
    )]
    pub connection_timeout: Duration,

    /// Grace period for in-flight requests at shutdown
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_shutdown_grace"
    )]
    pub shutdown_grace: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            verify_ssl: true,
            connection_pool: ConnectionPoolConfig::default(),
        }
    }
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: default_max_idle_per_host(),
            idle_timeout: default_idle_timeout(),
            connection_timeout: default_connection_timeout(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        self.connection_pool.validate()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

impl Validatable for ConnectionPoolConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.max_idle_per_host,
            "max_idle_per_host",
            self.domain_name(),
        )?;

        validate_positive(
            self.idle_timeout.as_secs(),
            "idle_timeout",
            self.domain_name(),
        )?;

        validate_positive(
            self.connection_timeout.as_secs(),
            "connection_timeout",
            self.domain_name(),
        )?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http.connection_pool"
    }
}

// Default value functions
fn default_user_agent() -> String {
    "TaigaMcp/0.3".to_string()
}

fn default_max_idle_per_host() -> usize {
    10
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(90)
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.user_agent, "TaigaMcp/0.3");
        assert!(config.verify_ssl);
        assert_eq!(config.connection_pool.max_idle_per_host, 10);
        assert_eq!(config.connection_pool.idle_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_http_config_validation() {
        let mut config = HttpConfig::default();
        assert!(config.validate().is_ok());

        // Test empty user agent
        config.user_agent = String::new();
        assert!(config.validate().is_err());

        // Test zero pool size
        config = HttpConfig::default();
        config.connection_pool.max_idle_per_host = 0;
        assert!(config.validate().is_err());
    }
}
