//! Protocol version negotiation and capability flags

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Protocol version the server prefers
pub const PREFERRED_PROTOCOL_VERSION: &str = "2024-11-05";

/// Supported MCP protocol versions
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26"];

/// Pick the protocol version for a client request
pub fn negotiate_protocol_version(client_version: &str) -> String {
    if SUPPORTED_PROTOCOL_VERSIONS.contains(&client_version) {
        client_version.to_string()
    } else {
        PREFERRED_PROTOCOL_VERSION.to_string()
    }
}

/// Capabilities advertised by a client; the server only needs presence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Tools capability flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Resources capability flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcesCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<bool>,

    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Prompts capability flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptsCapability {
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Capabilities advertised by this server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapability>,
}

impl ServerCapabilities {
    /// The full capability set of this server: static tools, resources and
    /// prompts, no change notifications.
    pub fn full() -> Self {
        Self {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
            resources: Some(ResourcesCapability {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            prompts: Some(PromptsCapability {
                list_changed: Some(false),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_version_is_echoed() {
        assert_eq!(negotiate_protocol_version("2025-03-26"), "2025-03-26");
    }

    #[test]
    fn test_unknown_version_falls_back() {
        assert_eq!(negotiate_protocol_version("1999-01-01"), PREFERRED_PROTOCOL_VERSION);
    }

    #[test]
    fn test_capabilities_serialize_camel_case() {
        let caps = ServerCapabilities::full();
        let encoded = serde_json::to_value(&caps).unwrap();
        assert_eq!(encoded["tools"]["listChanged"], false);
        assert_eq!(encoded["resources"]["subscribe"], false);
    }
}
