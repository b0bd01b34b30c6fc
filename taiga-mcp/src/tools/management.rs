//! Management tools that do not touch the upstream API surface directly

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use taiga_client::{CachedClient, TaigaError, TaigaResult};

use crate::context::InvocationContext;
use crate::error::McpResult;
use crate::protocol::{ToolAnnotations, ToolDescriptor};
use crate::registry::{RegisteredTool, ToolHandler, ToolRegistry};

/// `taiga_cache_stats`: response cache counters
struct CacheStatsTool {
    client: Arc<CachedClient>,
}

#[async_trait]
impl ToolHandler for CacheStatsTool {
    async fn call(&self, _args: Value, _ctx: &InvocationContext) -> TaigaResult<Value> {
        let stats = self.client.stats();
        Ok(json!({
            "hits": stats.hits,
            "misses": stats.misses,
            "evictions": stats.evictions,
            "size": stats.size,
            "hit_rate": stats.hit_rate,
        }))
    }
}

/// `taiga_cache_clear`: clear the whole cache or one project's entries
struct CacheClearTool {
    client: Arc<CachedClient>,
}

#[async_trait]
impl ToolHandler for CacheClearTool {
    async fn call(&self, args: Value, _ctx: &InvocationContext) -> TaigaResult<Value> {
        let project_id = match args.get("project_id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_i64().ok_or_else(|| {
                TaigaError::invalid_input("project_id", "expected integer")
            })?),
        };

        let cleared = match project_id {
            Some(id) => self.client.clear_project(id),
            None => self.client.clear_all(),
        };

        Ok(json!({ "cleared_entries": cleared }))
    }
}

/// `taiga_auth_status`: current session state, no token material
struct AuthStatusTool {
    client: Arc<CachedClient>,
}

#[async_trait]
impl ToolHandler for AuthStatusTool {
    async fn call(&self, _args: Value, _ctx: &InvocationContext) -> TaigaResult<Value> {
        let status = self.client.inner().auth_status().await;
        Ok(json!({
            "authenticated": status.authenticated,
            "expires_at": status.expires_at.map(|t| t.to_rfc3339()),
        }))
    }
}

/// `taiga_login`: establish a session with explicit credentials
struct LoginTool {
    client: Arc<CachedClient>,
}

#[async_trait]
impl ToolHandler for LoginTool {
    async fn call(&self, args: Value, _ctx: &InvocationContext) -> TaigaResult<Value> {
        let username = args
            .get("username")
            .and_then(Value::as_str)
            .ok_or_else(|| TaigaError::invalid_input("username", "required parameter is missing"))?;
        let password = args
            .get("password")
            .and_then(Value::as_str)
            .ok_or_else(|| TaigaError::invalid_input("password", "required parameter is missing"))?;

        let session = self.client.inner().login(username, password).await?;

        // Token material stays inside the cache
        Ok(json!({
            "authenticated": true,
            "expires_at": session.expires_at.map(|t| t.to_rfc3339()),
        }))
    }
}

/// `taiga_logout`: drop the session and identity-scoped cache entries
struct LogoutTool {
    client: Arc<CachedClient>,
}

#[async_trait]
impl ToolHandler for LogoutTool {
    async fn call(&self, _args: Value, _ctx: &InvocationContext) -> TaigaResult<Value> {
        self.client.logout().await;
        Ok(json!({ "authenticated": false }))
    }
}

/// `taiga_refresh_token`: force a token refresh
struct RefreshTokenTool {
    client: Arc<CachedClient>,
}

#[async_trait]
impl ToolHandler for RefreshTokenTool {
    async fn call(&self, _args: Value, _ctx: &InvocationContext) -> TaigaResult<Value> {
        let session = self.client.inner().refresh_token().await?;
        Ok(json!({
            "authenticated": true,
            "expires_at": session.expires_at.map(|t| t.to_rfc3339()),
        }))
    }
}

fn descriptor(
    name: &str,
    description: &str,
    schema: Value,
    read_only: bool,
    idempotent: bool,
    open_world: bool,
    tags: &[&str],
) -> ToolDescriptor {
    ToolDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: schema,
        annotations: ToolAnnotations {
            title: None,
            read_only_hint: Some(read_only),
            destructive_hint: None,
            idempotent_hint: idempotent.then_some(true),
            open_world_hint: Some(open_world),
        },
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn empty_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Register the management tool set
pub fn register_management_tools(
    registry: &mut ToolRegistry,
    client: Arc<CachedClient>,
) -> McpResult<()> {
    registry.register(RegisteredTool {
        descriptor: descriptor(
            "taiga_cache_stats",
            "Report response cache statistics: hits, misses, evictions, size and hit rate",
            empty_schema(),
            true,
            true,
            false,
            &["cache", "stats"],
        ),
        safe_method: true,
        handler: Arc::new(CacheStatsTool {
            client: client.clone(),
        }),
    })?;

    registry.register(RegisteredTool {
        descriptor: descriptor(
            "taiga_cache_clear",
            "Clear cached responses, optionally restricted to one project",
            json!({
                "type": "object",
                "properties": {
                    "project_id": {
                        "type": "integer",
                        "description": "Only clear entries scoped to this project"
                    }
                }
            }),
            false,
            true,
            false,
            &["cache", "clear"],
        ),
        safe_method: false,
        handler: Arc::new(CacheClearTool {
            client: client.clone(),
        }),
    })?;

    registry.register(RegisteredTool {
        descriptor: descriptor(
            "taiga_auth_status",
            "Report whether a session is established and when it expires",
            empty_schema(),
            true,
            true,
            false,
            &["auth", "status"],
        ),
        safe_method: true,
        handler: Arc::new(AuthStatusTool {
            client: client.clone(),
        }),
    })?;

    registry.register(RegisteredTool {
        descriptor: descriptor(
            "taiga_login",
            "Authenticate against the Taiga instance with username and password",
            json!({
                "type": "object",
                "properties": {
                    "username": {"type": "string", "description": "Taiga username"},
                    "password": {"type": "string", "description": "Taiga password"}
                },
                "required": ["username", "password"]
            }),
            false,
            false,
            true,
            &["auth", "login"],
        ),
        safe_method: false,
        handler: Arc::new(LoginTool {
            client: client.clone(),
        }),
    })?;

    registry.register(RegisteredTool {
        descriptor: descriptor(
            "taiga_logout",
            "Drop the current session and identity-scoped cache entries",
            empty_schema(),
            false,
            true,
            true,
            &["auth", "logout"],
        ),
        safe_method: false,
        handler: Arc::new(LogoutTool {
            client: client.clone(),
        }),
    })?;

    registry.register(RegisteredTool {
        descriptor: descriptor(
            "taiga_refresh_token",
            "Force a refresh of the current auth token",
            empty_schema(),
            false,
            false,
            true,
            &["auth", "refresh"],
        ),
        safe_method: false,
        handler: Arc::new(RefreshTokenTool { client }),
    })?;

    Ok(())
}
