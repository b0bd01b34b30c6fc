//! Transport abstraction over the upstream REST API

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::errors::{TaigaError, TaigaResult};
use crate::session::HttpSession;

/// HTTP methods used against the Taiga API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    /// Get the string representation of the HTTP method
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Whether the method is safe in the HTTP sense
    pub fn is_safe(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = TaigaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            other => Err(TaigaError::internal(format!("invalid HTTP method: {}", other))),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

/// One request to the upstream API
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    /// Create a request with no query or body
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }
}

/// Raw upstream response before error mapping
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
    pub retry_after: Option<Duration>,
}

impl ApiResponse {
    /// Successful response helper
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body,
            retry_after: None,
        }
    }

    /// Response with a given status and empty body
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Value::Null,
            retry_after: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport over the upstream REST API
///
/// The production implementation goes through the HTTP session pool; tests
/// substitute a scripted mock.
#[async_trait]
pub trait TaigaTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> TaigaResult<ApiResponse>;
}

/// HTTPS transport backed by the session pool
pub struct HttpTransport {
    base_url: Url,
    session: Arc<HttpSession>,
}

impl HttpTransport {
    /// Create a transport for the given base URL
    pub fn new(base_url: &str, session: Arc<HttpSession>) -> TaigaResult<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| TaigaError::internal(format!("invalid base URL: {}", e)))?;

        Ok(Self { base_url, session })
    }

    fn build_url(&self, path: &str) -> TaigaResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TaigaError::internal(format!("invalid request path '{}': {}", path, e)))
    }
}

#[async_trait]
impl TaigaTransport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> TaigaResult<ApiResponse> {
        let _guard = self.session.acquire()?;

        let url = self.build_url(&request.path)?;
        debug!("{} {}", request.method, url);

        let mut builder = self
            .session
            .client()
            .request(request.method.into(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        Ok(ApiResponse {
            status,
            body,
            retry_after,
        })
    }
}

/// Scripted transport for tests
///
/// Responses are served from an ordered queue first, then from per-route
/// mocks keyed by `"METHOD path"`. Every request is recorded.
#[derive(Default)]
pub struct MockTransport {
    queue: Mutex<VecDeque<TaigaResult<ApiResponse>>>,
    routes: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    /// Create an empty mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response regardless of route
    pub fn enqueue(&self, response: TaigaResult<ApiResponse>) {
        self.queue.lock().push_back(response);
    }

    /// Queue a sequence of bare statuses (non-2xx become errors at the client)
    pub fn enqueue_statuses(&self, statuses: &[u16]) {
        let mut queue = self.queue.lock();
        for &status in statuses {
            queue.push_back(Ok(ApiResponse::status(status)));
        }
    }

    /// Register a per-route mock body
    pub fn add_mock(&self, method: HttpMethod, path: &str, body: Value) {
        self.routes
            .lock()
            .insert(format!("{} {}", method.as_str(), path), body);
    }

    /// All recorded requests
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    /// Number of recorded requests for a route
    pub fn request_count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl TaigaTransport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> TaigaResult<ApiResponse> {
        let key = format!("{} {}", request.method.as_str(), request.path);
        self.requests.lock().push(request);

        if let Some(next) = self.queue.lock().pop_front() {
            return next;
        }

        if let Some(body) = self.routes.lock().get(&key) {
            return Ok(ApiResponse::ok(body.clone()));
        }

        Ok(ApiResponse::status(404))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_http_method_parsing() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("PATCH".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_safe_methods() {
        assert!(HttpMethod::Get.is_safe());
        assert!(HttpMethod::Head.is_safe());
        assert!(!HttpMethod::Post.is_safe());
        assert!(!HttpMethod::Delete.is_safe());
    }

    #[tokio::test]
    async fn test_mock_transport_queue_order() {
        let mock = MockTransport::new();
        mock.enqueue_statuses(&[503, 200]);

        let first = mock
            .execute(ApiRequest::new(HttpMethod::Get, "/projects"))
            .await
            .unwrap();
        assert_eq!(first.status, 503);

        let second = mock
            .execute(ApiRequest::new(HttpMethod::Get, "/projects"))
            .await
            .unwrap();
        assert_eq!(second.status, 200);

        assert_eq!(mock.request_count(HttpMethod::Get, "/projects"), 2);
    }

    #[tokio::test]
    async fn test_mock_transport_routes() {
        let mock = MockTransport::new();
        mock.add_mock(HttpMethod::Get, "/users/me", json!({"id": 1, "username": "me"}));

        let response = mock
            .execute(ApiRequest::new(HttpMethod::Get, "/users/me"))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body["username"], "me");

        let missing = mock
            .execute(ApiRequest::new(HttpMethod::Get, "/unknown"))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);
    }
}
