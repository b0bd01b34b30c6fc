//! Response cache configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether response caching is enabled globally
    #[serde(default = "crate::domains::utils::default_true")]
    pub enabled: bool,

    /// Default TTL for cacheable responses without an endpoint policy
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_ttl"
    )]
    pub default_ttl: Duration,

    /// Maximum number of cached entries
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: default_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

impl Validatable for CacheConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.enabled {
            validate_positive(self.default_ttl.as_secs(), "default_ttl", self.domain_name())?;
            validate_positive(self.max_entries, "max_entries", self.domain_name())?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "cache"
    }
}

// Default value functions
fn default_ttl() -> Duration {
    Duration::from_secs(300)
}

fn default_max_entries() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.max_entries, 1000);
    }

    #[test]
    fn test_cache_config_validation() {
        let mut config = CacheConfig::default();
        assert!(config.validate().is_ok());

        config.max_entries = 0;
        assert!(config.validate().is_err());

        // A disabled cache skips knob validation
        config.enabled = false;
        assert!(config.validate().is_ok());
    }
}
