//! Composition root and lifecycle

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use taiga_client::{
    AuthManager, CachedClient, Credentials, HttpSession, HttpTransport, TaigaClient,
    TaigaTransport,
};
use taiga_config::{TaigaConfig, TransportMode};
use taiga_resilience::{RetryPolicy, ShutdownCoordinator};

use crate::error::{McpError, McpResult};
use crate::middleware::{
    ErrorHandlingMiddleware, MiddlewareChain, RateLimitMiddleware, RequestLoggingMiddleware,
    TimingMiddleware, TokenBucket,
};
use crate::prompts::register_prompts;
use crate::registry::{PromptRegistry, ResourceRegistry, ToolRegistry};
use crate::resources::register_resources;
use crate::server::{McpRequestHandler, McpServer};
use crate::tools::catalog::register_catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Created,
    Started,
    Stopped,
}

/// The running service: owns every singleton of the pipeline and exposes
/// `start`/`shutdown`.
///
/// Construction wires leaves first: session pool, transport, token cache,
/// client, response cache, rate bucket, middleware chain, registries,
/// server. Shutdown unwinds in reverse.
pub struct McpService {
    config: TaigaConfig,
    server: Arc<McpServer>,
    cached: Arc<CachedClient>,
    session: Option<Arc<HttpSession>>,
    coordinator: Arc<ShutdownCoordinator>,
    state: Mutex<LifecycleState>,
}

impl McpService {
    /// Build the full service from configuration
    pub fn from_config(config: TaigaConfig) -> McpResult<Self> {
        let session = Arc::new(
            HttpSession::new(&config.http, config.upstream.request_timeout)
                .map_err(|e| McpError::Configuration {
                    message: e.to_string(),
                })?,
        );
        let transport = Arc::new(
            HttpTransport::new(&config.upstream.base_url, session.clone()).map_err(|e| {
                McpError::Configuration {
                    message: e.to_string(),
                }
            })?,
        );

        Self::with_transport(config, Some(session), transport)
    }

    /// Build the service over an arbitrary transport (tests use a mock)
    pub fn with_transport(
        config: TaigaConfig,
        session: Option<Arc<HttpSession>>,
        transport: Arc<dyn TaigaTransport>,
    ) -> McpResult<Self> {
        let auth = Arc::new(AuthManager::new(
            transport.clone(),
            Credentials::from(&config.upstream),
            config.upstream.token_refresh_threshold,
        ));
        let client = Arc::new(TaigaClient::new(transport, auth));
        let cached = Arc::new(CachedClient::new(client, &config.cache));

        let bucket = Arc::new(TokenBucket::new(
            config.rate_limit.requests_per_second,
            config.rate_limit.burst_size,
        ));

        // Outermost to innermost
        let chain = Arc::new(MiddlewareChain::new(vec![
            Arc::new(ErrorHandlingMiddleware::new(
                RetryPolicy::with_retries(config.upstream.max_retries),
                config.upstream.production,
            )),
            Arc::new(RateLimitMiddleware::new(bucket)),
            Arc::new(TimingMiddleware),
            Arc::new(RequestLoggingMiddleware),
        ]));

        let mut tools = ToolRegistry::new();
        register_catalog(&mut tools, cached.clone())?;

        let mut resources = ResourceRegistry::new();
        register_resources(&mut resources, cached.clone())?;

        let mut prompts = PromptRegistry::new();
        register_prompts(&mut prompts)?;

        info!(
            tools = tools.len(),
            resources = resources.len(),
            prompts = prompts.len(),
            "Catalog registered"
        );

        let handler = McpRequestHandler::new(
            Arc::new(tools),
            Arc::new(resources),
            Arc::new(prompts),
            chain,
            config.upstream.request_timeout,
            config.upstream.production,
        );

        let coordinator = Arc::new(ShutdownCoordinator::with_timeout(
            config.http.connection_pool.shutdown_grace,
        ));
        let server = Arc::new(McpServer::new(handler, coordinator.clone()));

        Ok(Self {
            config,
            server,
            cached,
            session,
            coordinator,
            state: Mutex::new(LifecycleState::Created),
        })
    }

    /// The dispatching server (tests drive it directly)
    pub fn server(&self) -> Arc<McpServer> {
        self.server.clone()
    }

    /// Run the configured transport until it terminates. Double start is an
    /// error.
    pub async fn start(&self) -> McpResult<()> {
        {
            let mut state = self.state.lock().await;
            if *state != LifecycleState::Created {
                return Err(McpError::lifecycle(format!(
                    "start called in state {:?}",
                    *state
                )));
            }
            *state = LifecycleState::Started;
        }

        match self.config.mcp.transport {
            TransportMode::Stdio => self.server.clone().run_stdio().await,
            TransportMode::Http => {
                self.server
                    .clone()
                    .run_http(&self.config.mcp.host, self.config.mcp.port)
                    .await
            }
        }
    }

    /// Tear the service down in reverse construction order. Double shutdown
    /// is an error.
    pub async fn shutdown(&self) -> McpResult<()> {
        {
            let mut state = self.state.lock().await;
            if *state == LifecycleState::Stopped {
                return Err(McpError::lifecycle("shutdown called twice"));
            }
            *state = LifecycleState::Stopped;
        }

        info!("Shutting down");

        // Registries and middleware are immutable; nothing to drain there.
        // Reject new invocations and wait for in-flight ones.
        if let Err(e) = self.coordinator.shutdown().await {
            tracing::warn!("Shutdown coordinator: {}", e);
        }

        // Drop cached responses, then the session token.
        self.cached.clear_all();
        self.cached.inner().logout().await;

        // Close the connection pool last: grace period, then force.
        if let Some(session) = &self.session {
            session.shutdown().await;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
