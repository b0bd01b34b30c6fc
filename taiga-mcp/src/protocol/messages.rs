//! MCP-specific message types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::capabilities::{ClientCapabilities, ServerCapabilities};

// === Initialize Protocol ===

/// Parameters for the initialize method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeParams {
    /// Protocol version
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,

    /// Client capabilities
    #[serde(default)]
    pub capabilities: ClientCapabilities,

    /// Client information
    #[serde(rename = "clientInfo", skip_serializing_if = "Option::is_none")]
    pub client_info: Option<ClientInfo>,
}

/// Result of the initialize method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    /// Protocol version
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,

    /// Server capabilities
    pub capabilities: ServerCapabilities,

    /// Server information
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Client information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Server information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

// === Tool Protocol ===

/// Machine-readable side-effect hints for a tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolAnnotations {
    /// Human title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Handler issues no upstream writes and mutates no local state beyond
    /// caches and metrics
    #[serde(rename = "readOnlyHint", skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,

    /// Hosts may prompt for confirmation before calling
    #[serde(rename = "destructiveHint", skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,

    /// Repeating the call with identical arguments is safe
    #[serde(rename = "idempotentHint", skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,

    /// The tool reaches an external system
    #[serde(rename = "openWorldHint", skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

/// Tool descriptor as listed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Input schema for the tool
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,

    /// Side-effect annotations
    #[serde(default)]
    pub annotations: ToolAnnotations,

    /// Entity/operation tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Parameters for tools/call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsCallParams {
    /// Tool name to call
    pub name: String,

    /// Tool arguments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// Result of tools/list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsListResult {
    /// List of available tools
    pub tools: Vec<ToolDescriptor>,

    /// Next cursor for pagination; the catalog fits one page
    #[serde(skip_serializing_if = "Option::is_none", rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// Result of tools/call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsCallResult {
    /// Tool execution content
    pub content: Vec<ToolContent>,

    /// Whether the tool call is an error
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolsCallResult {
    /// Successful result carrying a JSON payload rendered as text
    pub fn json(value: &Value) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
            }],
            is_error: false,
        }
    }

    /// Error result with a short message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// Content returned by tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

// === Resource Protocol ===

/// Resource descriptor as listed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// URI template, e.g. `taiga://projects/{project_id}/stats`
    pub uri: String,

    /// Resource name
    pub name: String,

    /// Resource description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// MIME type of the content
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Result of resources/list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcesListResult {
    pub resources: Vec<ResourceDescriptor>,
}

/// Parameters for resources/read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcesReadParams {
    pub uri: String,
}

/// One piece of resource content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContent {
    pub uri: String,

    #[serde(rename = "mimeType")]
    pub mime_type: String,

    pub text: String,
}

/// Result of resources/read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcesReadResult {
    pub contents: Vec<ResourceContent>,
}

// === Prompt Protocol ===

/// Declared prompt argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,
}

/// Prompt descriptor as listed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDescriptor {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<PromptArgument>,
}

/// Result of prompts/list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptsListResult {
    pub prompts: Vec<PromptDescriptor>,
}

/// Parameters for prompts/get
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptsGetParams {
    pub name: String,

    #[serde(default)]
    pub arguments: HashMap<String, String>,
}

/// One rendered prompt message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: ToolContent,
}

/// Result of prompts/get
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptsGetResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub messages: Vec<PromptMessage>,
}

impl PromptsGetResult {
    /// A single user-role text message
    pub fn user_text(description: Option<String>, text: String) -> Self {
        Self {
            description,
            messages: vec![PromptMessage {
                role: "user".to_string(),
                content: ToolContent::Text { text },
            }],
        }
    }
}
