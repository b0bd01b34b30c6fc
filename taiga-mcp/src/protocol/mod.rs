//! MCP protocol implementation: JSON-RPC 2.0 envelope and MCP message types

pub mod capabilities;
pub mod jsonrpc;
pub mod messages;

pub use capabilities::{
    negotiate_protocol_version, ClientCapabilities, ServerCapabilities,
    PREFERRED_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use messages::{
    ClientInfo, InitializeParams, InitializeResult, PromptArgument, PromptDescriptor,
    PromptMessage, PromptsGetParams, PromptsGetResult, PromptsListResult, ResourceContent,
    ResourceDescriptor, ResourcesListResult, ResourcesReadParams, ResourcesReadResult, ServerInfo,
    ToolAnnotations, ToolContent, ToolDescriptor, ToolsCallParams, ToolsCallResult,
    ToolsListResult,
};
