//! Rate limiting configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};

/// Token bucket rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Token refill rate in requests per second
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Burst capacity of the bucket
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

impl Validatable for RateLimitConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.requests_per_second <= 0.0 {
            return Err(self.validation_error(format!(
                "requests_per_second must be greater than 0, got {}",
                self.requests_per_second
            )));
        }
        validate_positive(self.burst_size, "burst_size", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "rate_limit"
    }
}

// Default value functions
fn default_requests_per_second() -> f64 {
    10.0
}

fn default_burst_size() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_defaults() {
        let config = RateLimitConfig::default();
        assert_eq!(config.requests_per_second, 10.0);
        assert_eq!(config.burst_size, 10);
    }

    #[test]
    fn test_rate_limit_validation() {
        let mut config = RateLimitConfig::default();
        assert!(config.validate().is_ok());

        config.requests_per_second = 0.0;
        assert!(config.validate().is_err());

        config.requests_per_second = 5.0;
        config.burst_size = 0;
        assert!(config.validate().is_err());
    }
}
