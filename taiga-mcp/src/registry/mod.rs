//! Tool, resource and prompt registries
//!
//! All three registries are populated once at startup and read-only on the
//! hot path. Duplicate names are a fatal startup error.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use taiga_client::TaigaResult;

use crate::context::InvocationContext;
use crate::error::{McpError, McpResult};
use crate::protocol::{PromptDescriptor, ResourceDescriptor, ToolDescriptor};

/// Async handler behind a registered tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value, ctx: &InvocationContext) -> TaigaResult<Value>;
}

/// A tool with its metadata and handler
pub struct RegisteredTool {
    /// Descriptor listed to clients
    pub descriptor: ToolDescriptor,

    /// The underlying HTTP method is safe (GET/HEAD)
    pub safe_method: bool,

    /// Execution handler
    pub handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    pub fn read_only(&self) -> bool {
        self.descriptor.annotations.read_only_hint.unwrap_or(false)
    }

    pub fn idempotent(&self) -> bool {
        self.descriptor.annotations.idempotent_hint.unwrap_or(false)
    }

    pub fn destructive(&self) -> bool {
        self.descriptor.annotations.destructive_hint.unwrap_or(false)
    }
}

/// Name-indexed tool catalog
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<RegisteredTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; duplicate names are a startup error
    pub fn register(&mut self, tool: RegisteredTool) -> McpResult<()> {
        let name = tool.descriptor.name.clone();
        if self.tools.contains_key(&name) {
            return Err(McpError::DuplicateRegistration { kind: "tool", name });
        }
        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    /// O(1) lookup by name
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredTool>> {
        self.tools.get(name).cloned()
    }

    /// All descriptors, sorted by name for a stable listing
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<ToolDescriptor> = self
            .tools
            .values()
            .map(|tool| tool.descriptor.clone())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Async handler behind a registered resource
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn read(
        &self,
        params: HashMap<String, String>,
        ctx: &InvocationContext,
    ) -> TaigaResult<Value>;
}

/// A resource with its URI template and handler
pub struct RegisteredResource {
    pub descriptor: ResourceDescriptor,
    pub handler: Arc<dyn ResourceHandler>,
}

/// URI-template-indexed resource catalog
#[derive(Default)]
pub struct ResourceRegistry {
    resources: Vec<Arc<RegisteredResource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource; duplicate URI templates are a startup error
    pub fn register(&mut self, resource: RegisteredResource) -> McpResult<()> {
        let uri = resource.descriptor.uri.clone();
        if self.resources.iter().any(|r| r.descriptor.uri == uri) {
            return Err(McpError::DuplicateRegistration {
                kind: "resource",
                name: uri,
            });
        }
        self.resources.push(Arc::new(resource));
        Ok(())
    }

    /// Resolve a concrete URI against the registered templates, binding
    /// `{var}` path variables.
    pub fn resolve(&self, uri: &str) -> Option<(Arc<RegisteredResource>, HashMap<String, String>)> {
        for resource in &self.resources {
            if let Some(params) = match_template(&resource.descriptor.uri, uri) {
                return Some((resource.clone(), params));
            }
        }
        None
    }

    /// All descriptors in registration order
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        self.resources
            .iter()
            .map(|resource| resource.descriptor.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }
}

/// Pure renderer behind a registered prompt; performs no I/O
pub trait PromptHandler: Send + Sync {
    fn render(&self, args: &HashMap<String, String>) -> TaigaResult<String>;
}

/// A prompt with its parameter list and renderer
pub struct RegisteredPrompt {
    pub descriptor: PromptDescriptor,
    pub handler: Arc<dyn PromptHandler>,
}

/// Name-indexed prompt catalog
#[derive(Default)]
pub struct PromptRegistry {
    prompts: HashMap<String, Arc<RegisteredPrompt>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prompt; duplicate names are a startup error
    pub fn register(&mut self, prompt: RegisteredPrompt) -> McpResult<()> {
        let name = prompt.descriptor.name.clone();
        if self.prompts.contains_key(&name) {
            return Err(McpError::DuplicateRegistration {
                kind: "prompt",
                name,
            });
        }
        self.prompts.insert(name, Arc::new(prompt));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<RegisteredPrompt>> {
        self.prompts.get(name).cloned()
    }

    pub fn descriptors(&self) -> Vec<PromptDescriptor> {
        let mut descriptors: Vec<PromptDescriptor> = self
            .prompts
            .values()
            .map(|prompt| prompt.descriptor.clone())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }
}

/// Match a concrete URI against a `{var}` template, returning bound variables
fn match_template(template: &str, uri: &str) -> Option<HashMap<String, String>> {
    let template_segments: Vec<&str> = template.split('/').collect();
    let uri_segments: Vec<&str> = uri.split('/').collect();

    if template_segments.len() != uri_segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (pattern, actual) in template_segments.iter().zip(uri_segments.iter()) {
        if let Some(var) = pattern.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
            if actual.is_empty() {
                return None;
            }
            params.insert(var.to_string(), (*actual).to_string());
        } else if pattern != actual {
            return None;
        }
    }

    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ToolAnnotations;
    use serde_json::json;

    struct NoopTool;

    #[async_trait]
    impl ToolHandler for NoopTool {
        async fn call(&self, _args: Value, _ctx: &InvocationContext) -> TaigaResult<Value> {
            Ok(json!({"ok": true}))
        }
    }

    struct NoopResource;

    #[async_trait]
    impl ResourceHandler for NoopResource {
        async fn read(
            &self,
            _params: HashMap<String, String>,
            _ctx: &InvocationContext,
        ) -> TaigaResult<Value> {
            Ok(json!({}))
        }
    }

    fn tool(name: &str) -> RegisteredTool {
        RegisteredTool {
            descriptor: ToolDescriptor {
                name: name.to_string(),
                description: "test".to_string(),
                input_schema: json!({"type": "object"}),
                annotations: ToolAnnotations::default(),
                tags: vec![],
            },
            safe_method: true,
            handler: Arc::new(NoopTool),
        }
    }

    #[test]
    fn test_duplicate_tool_registration_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("taiga_list_projects")).unwrap();

        let result = registry.register(tool("taiga_list_projects"));
        assert!(matches!(
            result,
            Err(McpError::DuplicateRegistration { kind: "tool", .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_tool_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("taiga_get_project")).unwrap();

        assert!(registry.get("taiga_get_project").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_descriptors_sorted_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("b_tool")).unwrap();
        registry.register(tool("a_tool")).unwrap();

        let names: Vec<String> = registry.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a_tool", "b_tool"]);
    }

    #[test]
    fn test_uri_template_matching() {
        let params = match_template(
            "taiga://projects/{project_id}/stats",
            "taiga://projects/42/stats",
        )
        .unwrap();
        assert_eq!(params.get("project_id").map(String::as_str), Some("42"));

        assert!(match_template("taiga://users/me", "taiga://users/me").is_some());
        assert!(match_template("taiga://users/me", "taiga://users/other").is_none());
        assert!(match_template("taiga://projects/{id}/stats", "taiga://projects/42").is_none());
    }

    #[test]
    fn test_resource_resolution() {
        let mut registry = ResourceRegistry::new();
        registry
            .register(RegisteredResource {
                descriptor: ResourceDescriptor {
                    uri: "taiga://projects/{project_id}/stats".to_string(),
                    name: "project-stats".to_string(),
                    description: None,
                    mime_type: Some("application/json".to_string()),
                },
                handler: Arc::new(NoopResource),
            })
            .unwrap();

        let (resource, params) = registry.resolve("taiga://projects/7/stats").unwrap();
        assert_eq!(resource.descriptor.name, "project-stats");
        assert_eq!(params.get("project_id").map(String::as_str), Some("7"));

        assert!(registry.resolve("taiga://projects/7/modules").is_none());
    }
}
