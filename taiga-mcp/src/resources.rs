//! Read-only resources exposed alongside the tool catalog

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use taiga_client::{CachedClient, TaigaError, TaigaResult};

use crate::context::InvocationContext;
use crate::error::McpResult;
use crate::protocol::ResourceDescriptor;
use crate::registry::{RegisteredResource, ResourceHandler, ResourceRegistry};

/// `taiga://users/me`: the authenticated user's profile
struct CurrentUserResource {
    client: Arc<CachedClient>,
}

#[async_trait]
impl ResourceHandler for CurrentUserResource {
    async fn read(
        &self,
        _params: HashMap<String, String>,
        _ctx: &InvocationContext,
    ) -> TaigaResult<Value> {
        let user = self.client.me().await?;
        Ok(serde_json::to_value(user)?)
    }
}

/// `taiga://projects/{project_id}/stats`: slow-moving project metrics
struct ProjectStatsResource {
    client: Arc<CachedClient>,
}

#[async_trait]
impl ResourceHandler for ProjectStatsResource {
    async fn read(
        &self,
        params: HashMap<String, String>,
        _ctx: &InvocationContext,
    ) -> TaigaResult<Value> {
        let project_id = parse_project_id(&params)?;
        let stats = self.client.project_stats(project_id).await?;
        Ok(serde_json::to_value(stats)?)
    }
}

/// `taiga://projects/{project_id}/modules`: project configuration
struct ProjectModulesResource {
    client: Arc<CachedClient>,
}

#[async_trait]
impl ResourceHandler for ProjectModulesResource {
    async fn read(
        &self,
        params: HashMap<String, String>,
        _ctx: &InvocationContext,
    ) -> TaigaResult<Value> {
        let project_id = parse_project_id(&params)?;
        self.client.project_modules(project_id).await
    }
}

fn parse_project_id(params: &HashMap<String, String>) -> TaigaResult<i64> {
    params
        .get("project_id")
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| TaigaError::invalid_input("project_id", "expected an integer path segment"))
}

/// Register the resource set
pub fn register_resources(
    registry: &mut ResourceRegistry,
    client: Arc<CachedClient>,
) -> McpResult<()> {
    registry.register(RegisteredResource {
        descriptor: ResourceDescriptor {
            uri: "taiga://users/me".to_string(),
            name: "current-user".to_string(),
            description: Some("Profile of the authenticated user".to_string()),
            mime_type: Some("application/json".to_string()),
        },
        handler: Arc::new(CurrentUserResource {
            client: client.clone(),
        }),
    })?;

    registry.register(RegisteredResource {
        descriptor: ResourceDescriptor {
            uri: "taiga://projects/{project_id}/stats".to_string(),
            name: "project-stats".to_string(),
            description: Some("Burndown-style statistics for a project".to_string()),
            mime_type: Some("application/json".to_string()),
        },
        handler: Arc::new(ProjectStatsResource {
            client: client.clone(),
        }),
    })?;

    registry.register(RegisteredResource {
        descriptor: ResourceDescriptor {
            uri: "taiga://projects/{project_id}/modules".to_string(),
            name: "project-modules".to_string(),
            description: Some("Modules configuration of a project".to_string()),
            mime_type: Some("application/json".to_string()),
        },
        handler: Arc::new(ProjectModulesResource { client }),
    })?;

    Ok(())
}
