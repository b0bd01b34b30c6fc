//! JSON-RPC 2.0 envelope types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC error codes
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Server-defined: request arrived before initialization
    pub const NOT_INITIALIZED: i32 = -32002;
}

/// JSON-RPC 2.0 request or notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,

    pub method: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a request with a string id
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    /// Notifications carry no id and expect no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,

    pub id: Option<Value>,
}

impl JsonRpcResponse {
    /// Successful response
    pub fn success(result: Value, id: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Error response
    pub fn error(error: JsonRpcError, id: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn parse_error(details: impl Into<String>) -> Self {
        Self {
            code: codes::PARSE_ERROR,
            message: format!("Parse error: {}", details.into()),
            data: None,
        }
    }

    pub fn invalid_request(details: impl Into<String>) -> Self {
        Self {
            code: codes::INVALID_REQUEST,
            message: format!("Invalid request: {}", details.into()),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: codes::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }

    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self {
            code: codes::INVALID_PARAMS,
            message: format!("Invalid params: {}", details.into()),
            data: None,
        }
    }

    pub fn internal_error(details: impl Into<String>) -> Self {
        Self {
            code: codes::INTERNAL_ERROR,
            message: details.into(),
            data: None,
        }
    }

    pub fn not_initialized() -> Self {
        Self {
            code: codes::NOT_INITIALIZED,
            message: "Server not initialized".to_string(),
            data: None,
        }
    }

    /// Attach structured data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_roundtrip() {
        let raw = r#"{"jsonrpc":"2.0","method":"tools/list","id":1}"#;
        let request: JsonRpcRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.method, "tools/list");
        assert!(!request.is_notification());

        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(encoded["jsonrpc"], "2.0");
        assert_eq!(encoded["id"], 1);
    }

    #[test]
    fn test_notification_has_no_id() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let request: JsonRpcRequest = serde_json::from_str(raw).unwrap();
        assert!(request.is_notification());
    }

    #[test]
    fn test_error_response_shape() {
        let response = JsonRpcResponse::error(
            JsonRpcError::method_not_found("bogus/method"),
            Some(json!(7)),
        );

        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["error"]["code"], codes::METHOD_NOT_FOUND);
        assert!(encoded.get("result").is_none());
        assert_eq!(encoded["id"], 7);
    }
}
