//! Upstream Taiga API configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upstream Taiga deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the Taiga REST API (e.g. `https://api.taiga.io/api/v1`)
    #[serde(default)]
    pub base_url: String,

    /// Username for password authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for password authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Pre-issued auth token; bypasses password authentication when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Per-request timeout
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_request_timeout"
    )]
    pub request_timeout: Duration,

    /// Maximum retry count for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Remaining token lifetime below which a proactive refresh is triggered
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_refresh_threshold"
    )]
    pub token_refresh_threshold: Duration,

    /// Whether error details are masked in responses and logs
    #[serde(default)]
    pub production: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: None,
            password: None,
            auth_token: None,
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
            token_refresh_threshold: default_refresh_threshold(),
            production: false,
        }
    }
}

impl UpstreamConfig {
    /// Whether any credential source is configured
    pub fn has_credentials(&self) -> bool {
        self.auth_token.is_some() || (self.username.is_some() && self.password.is_some())
    }
}

impl Validatable for UpstreamConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        validate_positive(
            self.request_timeout.as_secs(),
            "request_timeout",
            self.domain_name(),
        )?;

        // Password auth needs both halves
        if self.username.is_some() != self.password.is_some() {
            return Err(self.validation_error(
                "username and password must be provided together",
            ));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "upstream"
    }
}

// Default value functions
fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_retries() -> u32 {
    3
}

fn default_refresh_threshold() -> Duration {
    Duration::from_secs(300)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_config_defaults() {
        let config = UpstreamConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.token_refresh_threshold, Duration::from_secs(300));
        assert!(!config.production);
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_upstream_config_validation() {
        let mut config = UpstreamConfig {
            base_url: "https://api.taiga.io/api/v1".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        // Empty base URL is rejected
        config.base_url = String::new();
        assert!(config.validate().is_err());

        // Username without password is rejected
        config.base_url = "https://api.taiga.io/api/v1".to_string();
        config.username = Some("admin".to_string());
        assert!(config.validate().is_err());

        config.password = Some("secret".to_string());
        assert!(config.validate().is_ok());
        assert!(config.has_credentials());
    }

    #[test]
    fn test_token_counts_as_credentials() {
        let config = UpstreamConfig {
            base_url: "https://api.taiga.io/api/v1".to_string(),
            auth_token: Some("token-123".to_string()),
            ..Default::default()
        };
        assert!(config.has_credentials());
    }
}
