//! MCP server: JSON-RPC dispatch and transports

pub mod handler;

pub use handler::McpRequestHandler;

use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use taiga_resilience::ShutdownCoordinator;

use crate::error::{McpError, McpResult};
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// MCP server dispatching JSON-RPC messages to the request handler.
///
/// Requests are independent: each one is processed in its own task, so slow
/// upstream calls never block unrelated invocations. In-flight requests are
/// tracked with the shutdown coordinator; once shutdown begins, new requests
/// are rejected.
pub struct McpServer {
    handler: McpRequestHandler,
    coordinator: Arc<ShutdownCoordinator>,
    initialized: RwLock<bool>,
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
}

impl McpServer {
    pub fn new(handler: McpRequestHandler, coordinator: Arc<ShutdownCoordinator>) -> Self {
        Self {
            handler,
            coordinator,
            initialized: RwLock::new(false),
            requests_total: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
        }
    }

    /// Total and failed request counts
    pub fn request_counts(&self) -> (u64, u64) {
        (
            self.requests_total.load(Ordering::Relaxed),
            self.requests_failed.load(Ordering::Relaxed),
        )
    }

    /// Process one raw JSON-RPC message. Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        let request: JsonRpcRequest = match serde_json::from_str(raw) {
            Ok(request) => request,
            Err(e) => {
                self.requests_failed.fetch_add(1, Ordering::Relaxed);
                return Some(JsonRpcResponse::error(
                    JsonRpcError::parse_error(e.to_string()),
                    None,
                ));
            }
        };

        let id = request.id.clone();
        let is_notification = request.is_notification();

        if self.coordinator.is_shutting_down().await {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
            return (!is_notification).then(|| {
                JsonRpcResponse::error(
                    JsonRpcError::internal_error("server is shutting down"),
                    id,
                )
            });
        }

        self.coordinator.task_started().await;
        let result = self.dispatch(&request).await;
        self.coordinator.task_completed().await;

        if is_notification {
            if let Err(e) = result {
                debug!("Notification {} failed: {}", request.method, e);
            }
            return None;
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(value, id),
            Err(e) => {
                self.requests_failed.fetch_add(1, Ordering::Relaxed);
                JsonRpcResponse::error(self.to_rpc_error(e), id)
            }
        })
    }

    async fn dispatch(&self, request: &JsonRpcRequest) -> McpResult<serde_json::Value> {
        match request.method.as_str() {
            "initialize" => {
                let result = self.handler.handle_initialize(request.params.clone())?;
                *self.initialized.write().await = true;
                Ok(result)
            }
            "notifications/initialized" => Ok(json!({})),
            "ping" => Ok(json!({})),
            method => {
                if !*self.initialized.read().await {
                    return Err(McpError::NotInitialized);
                }

                match method {
                    "tools/list" => self.handler.handle_tools_list(),
                    "tools/call" => self.handler.handle_tools_call(request.params.clone()).await,
                    "resources/list" => self.handler.handle_resources_list(),
                    "resources/read" => {
                        self.handler.handle_resources_read(request.params.clone()).await
                    }
                    "prompts/list" => self.handler.handle_prompts_list(),
                    "prompts/get" => self.handler.handle_prompts_get(request.params.clone()).await,
                    other => Err(McpError::MethodNotFound {
                        method: other.to_string(),
                    }),
                }
            }
        }
    }

    fn to_rpc_error(&self, error: McpError) -> JsonRpcError {
        match error {
            McpError::MethodNotFound { method } => JsonRpcError::method_not_found(&method),
            McpError::InvalidParams { method: _, details } => JsonRpcError::invalid_params(details),
            McpError::InvalidJsonRpc { details } => JsonRpcError::invalid_request(details),
            McpError::NotInitialized => JsonRpcError::not_initialized(),
            McpError::Pipeline(e) => {
                JsonRpcError::internal_error(e.public_message(self.handler.production()))
                    .with_data(json!({"kind": e.kind()}))
            }
            other => JsonRpcError::internal_error(other.to_string()),
        }
    }

    /// Run over stdio: one line-delimited JSON message per line, responses
    /// written to stdout. Each request runs in its own task.
    pub async fn run_stdio(self: Arc<Self>) -> McpResult<()> {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use tokio::sync::mpsc;

        info!("MCP server ready on stdio");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(response) = rx.recv().await {
                if stdout.write_all(response.as_bytes()).await.is_err() {
                    break;
                }
                if stdout.write_all(b"\n").await.is_err() {
                    break;
                }
                if stdout.flush().await.is_err() {
                    break;
                }
            }
        });

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("EOF on stdin, shutting down stdio transport");
                    break;
                }
                Ok(_) => {
                    let message = line.trim().to_string();
                    if message.is_empty() {
                        continue;
                    }

                    let server = self.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(response) = server.handle_message(&message).await {
                            match serde_json::to_string(&response) {
                                Ok(encoded) => {
                                    let _ = tx.send(encoded);
                                }
                                Err(e) => error!("Failed to encode response: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    break;
                }
            }
        }

        drop(tx);
        let _ = writer.await;
        Ok(())
    }

    /// Run the streamable HTTP transport on the given address
    pub async fn run_http(self: Arc<Self>, host: &str, port: u16) -> McpResult<()> {
        use axum::{
            extract::State,
            http::StatusCode,
            response::IntoResponse,
            routing::{get, post},
            Json, Router,
        };
        use tower_http::cors::{Any, CorsLayer};

        async fn mcp_handler(
            State(server): State<Arc<McpServer>>,
            body: String,
        ) -> impl IntoResponse {
            match server.handle_message(&body).await {
                Some(response) => (StatusCode::OK, Json(serde_json::to_value(&response).unwrap_or(json!(null)))),
                // Notification: acknowledged without a body
                None => (StatusCode::ACCEPTED, Json(json!({"status": "accepted"}))),
            }
        }

        async fn health_handler() -> Json<serde_json::Value> {
            Json(json!({
                "status": "healthy",
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }))
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = Router::new()
            .route("/mcp", post(mcp_handler))
            .route("/health", get(health_handler))
            .layer(cors)
            .with_state(self);

        let bind_address = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_address)
            .await
            .map_err(|e| McpError::server(format!("failed to bind {}: {}", bind_address, e)))?;

        info!("MCP server listening on http://{}/mcp", bind_address);

        axum::serve(listener, app)
            .await
            .map_err(|e| McpError::server(format!("HTTP server error: {}", e)))
    }
}
