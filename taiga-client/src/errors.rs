//! Error taxonomy for upstream Taiga operations

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Result type for Taiga operations
pub type TaigaResult<T> = Result<T, TaigaError>;

/// Error type covering the whole request pipeline
#[derive(Error, Debug)]
pub enum TaigaError {
    /// Request shape or field-level validation failed
    #[error("Invalid input for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    /// No valid token could be produced, or upstream returned 401
    #[error("Authentication failed: {reason}")]
    Unauthenticated { reason: String },

    /// Upstream returned 403
    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    /// Upstream returned 404, or an unknown tool/resource/prompt name
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Upstream returned 409
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Local bucket exhausted past deadline, or upstream returned 429.
    /// Only the upstream flavour may be retried.
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        retry_after: Option<Duration>,
        upstream: bool,
    },

    /// Invocation deadline exceeded
    #[error("Timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },

    /// Transport failure or upstream 5xx
    #[error("Transient upstream failure: {message}")]
    Transient { message: String },

    /// Programming error; masked outward in production mode
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TaigaError {
    /// Stable kind tag surfaced to MCP clients
    pub fn kind(&self) -> &'static str {
        match self {
            TaigaError::InvalidInput { .. } => "invalid_input",
            TaigaError::Unauthenticated { .. } => "unauthenticated",
            TaigaError::PermissionDenied { .. } => "permission_denied",
            TaigaError::NotFound { .. } => "not_found",
            TaigaError::Conflict { .. } => "conflict",
            TaigaError::RateLimited { .. } => "rate_limited",
            TaigaError::Timeout { .. } => "timeout",
            TaigaError::Transient { .. } => "transient",
            TaigaError::Internal { .. } => "internal",
        }
    }

    /// Create an invalid-input error
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unauthenticated error
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a transient error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map an upstream HTTP status to an error
    ///
    /// `resource` names the addressed endpoint for 404s; `retry_after` is the
    /// parsed Retry-After header when present.
    pub fn from_status(
        status: u16,
        body: &Value,
        resource: &str,
        retry_after: Option<Duration>,
    ) -> Self {
        match status {
            401 => TaigaError::Unauthenticated {
                reason: upstream_detail(body).unwrap_or_else(|| "invalid or expired token".to_string()),
            },
            403 => TaigaError::PermissionDenied {
                reason: upstream_detail(body).unwrap_or_else(|| "forbidden".to_string()),
            },
            404 => TaigaError::NotFound {
                resource: resource.to_string(),
            },
            409 => TaigaError::Conflict {
                message: upstream_detail(body).unwrap_or_else(|| "conflicting state".to_string()),
            },
            422 | 400 => {
                let (field, message) = field_error(body);
                TaigaError::InvalidInput { field, message }
            }
            429 => TaigaError::RateLimited {
                retry_after,
                upstream: true,
            },
            s if s >= 500 => TaigaError::Transient {
                message: format!("upstream returned {}", s),
            },
            s => TaigaError::Internal {
                message: format!("unexpected upstream status {}", s),
            },
        }
    }

    /// Whether the error-handling middleware may retry this failure.
    ///
    /// A local rate-limit rejection means the deadline cannot fit the next
    /// token, so only the upstream 429 flavour is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TaigaError::Transient { .. } | TaigaError::RateLimited { upstream: true, .. }
        )
    }

    /// Suggested delay before retrying, if the upstream provided one
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            TaigaError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Short client-facing message with detail masked for production mode
    pub fn public_message(&self, production: bool) -> String {
        if production {
            match self {
                TaigaError::Internal { .. } => "internal error".to_string(),
                TaigaError::Transient { .. } => "upstream temporarily unavailable".to_string(),
                other => other.to_string(),
            }
        } else {
            self.to_string()
        }
    }
}

impl From<reqwest::Error> for TaigaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TaigaError::Timeout {
                elapsed: Duration::ZERO,
            }
        } else if err.is_connect() {
            TaigaError::Transient {
                message: format!("connection failed: {}", err),
            }
        } else if err.is_decode() {
            TaigaError::Internal {
                message: format!("response decode failed: {}", err),
            }
        } else {
            TaigaError::Transient {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for TaigaError {
    fn from(err: serde_json::Error) -> Self {
        TaigaError::Internal {
            message: format!("serialization error: {}", err),
        }
    }
}

/// Extract Taiga's error detail message from a response body
fn upstream_detail(body: &Value) -> Option<String> {
    body.get("_error_message")
        .or_else(|| body.get("detail"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Extract the first field-level validation error from a 422 body
fn field_error(body: &Value) -> (String, String) {
    if let Some(obj) = body.as_object() {
        for (field, detail) in obj {
            if field.starts_with('_') {
                continue;
            }
            let message = match detail {
                Value::Array(items) => items
                    .first()
                    .and_then(|v| v.as_str())
                    .unwrap_or("invalid value")
                    .to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return (field.clone(), message);
        }
    }

    (
        "body".to_string(),
        upstream_detail(body).unwrap_or_else(|| "validation failed".to_string()),
    )
}
