//! Error types for MCP operations

use thiserror::Error;

use taiga_client::TaigaError;

/// Result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;

/// Protocol- and lifecycle-level errors of the MCP server
#[derive(Error, Debug)]
pub enum McpError {
    /// Invalid JSON-RPC message
    #[error("Invalid JSON-RPC message: {details}")]
    InvalidJsonRpc { details: String },

    /// MCP method not found
    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    /// Invalid method parameters
    #[error("Invalid parameters for method {method}: {details}")]
    InvalidParams { method: String, details: String },

    /// Request received before initialization completed
    #[error("Server not initialized")]
    NotInitialized,

    /// Duplicate registration at startup
    #[error("Duplicate {kind} registration: {name}")]
    DuplicateRegistration { kind: &'static str, name: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Transport/server errors (bind failure, broken channel)
    #[error("Server error: {message}")]
    ServerError { message: String },

    /// Lifecycle misuse (double start, double shutdown)
    #[error("Lifecycle error: {message}")]
    Lifecycle { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {details}")]
    Serialization { details: String },

    /// Failure surfaced from the request pipeline
    #[error(transparent)]
    Pipeline(#[from] TaigaError),
}

impl McpError {
    /// Create an invalid-params error
    pub fn invalid_params(method: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidParams {
            method: method.into(),
            details: details.into(),
        }
    }

    /// Create a server error
    pub fn server(message: impl Into<String>) -> Self {
        Self::ServerError {
            message: message.into(),
        }
    }

    /// Create a lifecycle error
    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Serialization {
            details: err.to_string(),
        }
    }
}

impl From<taiga_config::ConfigError> for McpError {
    fn from(err: taiga_config::ConfigError) -> Self {
        McpError::Configuration {
            message: err.to_string(),
        }
    }
}
