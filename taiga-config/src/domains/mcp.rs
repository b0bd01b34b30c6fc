//! MCP transport configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// MCP transport selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum TransportMode {
    /// Line-delimited JSON over stdin/stdout
    #[default]
    Stdio,
    /// Streamable HTTP endpoint
    Http,
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stdio" => Ok(TransportMode::Stdio),
            "http" => Ok(TransportMode::Http),
            other => Err(format!("unknown transport: {}", other)),
        }
    }
}

/// MCP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Transport protocol
    #[serde(default)]
    pub transport: TransportMode,

    /// Host address for HTTP transport
    #[serde(default = "default_mcp_host")]
    pub host: String,

    /// Port for HTTP transport
    #[serde(default = "default_mcp_port")]
    pub port: u16,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::Stdio,
            host: default_mcp_host(),
            port: default_mcp_port(),
        }
    }
}

impl Validatable for McpConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.transport == TransportMode::Http {
            crate::validation::validate_port_range(self.port, "port", self.domain_name())?;
            crate::validation::validate_required_string(&self.host, "host", self.domain_name())?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "mcp"
    }
}

// Default value functions
fn default_mcp_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mcp_port() -> u16 {
    3001
}
