//! Tool shims over upstream endpoints
//!
//! Each tool is a descriptor naming one REST endpoint plus typed parameters;
//! a single generic handler validates arguments, binds the endpoint, and
//! calls the cached client. The catalog builds the ~200 descriptors from
//! per-family tables.

pub mod catalog;
pub mod management;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

use taiga_client::{ApiCall, CachedClient, Endpoint, HttpMethod, TaigaError, TaigaResult};

use crate::context::InvocationContext;
use crate::error::McpResult;
use crate::protocol::{ToolAnnotations, ToolDescriptor};
use crate::registry::{RegisteredTool, ToolHandler, ToolRegistry};

/// Where a parameter lands in the upstream request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Path,
    Query,
    Body,
}

/// JSON type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn json_name(&self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::String => value.is_string(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

/// One declared tool parameter
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
    pub description: String,
    pub kind: ParamKind,
}

/// Descriptor of one tool shim: metadata plus the endpoint it fronts
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub destructive: bool,
    pub idempotent: bool,
    pub params: Vec<ParamSpec>,
    pub endpoint: Endpoint,

    /// Parameter carrying the project scope, if any
    pub project_param: Option<String>,

    /// Parameter carrying the addressed entity id, if any
    pub entity_param: Option<String>,
}

impl ToolSpec {
    /// Uncached read (GET)
    pub fn read(name: &str, description: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            tags: Vec::new(),
            destructive: false,
            idempotent: true,
            params: Vec::new(),
            endpoint: Endpoint::new(endpoint_name(name), HttpMethod::Get, path),
            project_param: None,
            entity_param: None,
        }
    }

    /// Cached read (GET) with an endpoint-policy TTL
    pub fn cached_read(name: &str, description: &str, path: &str, ttl: Duration) -> Self {
        let mut spec = Self::read(name, description, path);
        spec.endpoint = Endpoint::cached_get(endpoint_name(name), path, ttl);
        spec
    }

    /// Write with the given method
    pub fn write(name: &str, description: &str, method: HttpMethod, path: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            tags: Vec::new(),
            destructive: false,
            idempotent: false,
            params: Vec::new(),
            endpoint: Endpoint::new(endpoint_name(name), method, path),
            project_param: None,
            entity_param: None,
        }
    }

    /// Destructive DELETE
    pub fn delete(name: &str, description: &str, path: &str) -> Self {
        let mut spec = Self::write(name, description, HttpMethod::Delete, path);
        spec.destructive = true;
        spec
    }

    /// Attach entity/operation tags
    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Declare a path parameter (always required)
    pub fn path_param(mut self, name: &str, ty: ParamType, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            ty,
            required: true,
            description: description.to_string(),
            kind: ParamKind::Path,
        });
        self
    }

    /// Declare an integer path parameter
    pub fn path_i64(self, name: &str, description: &str) -> Self {
        self.path_param(name, ParamType::Integer, description)
    }

    /// Declare a query parameter
    pub fn query(mut self, name: &str, ty: ParamType, required: bool, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            ty,
            required,
            description: description.to_string(),
            kind: ParamKind::Query,
        });
        self
    }

    /// Declare a body field
    pub fn body(mut self, name: &str, ty: ParamType, required: bool, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            ty,
            required,
            description: description.to_string(),
            kind: ParamKind::Body,
        });
        self
    }

    /// Name the parameter carrying the project scope
    pub fn project_scope(mut self, param: &str) -> Self {
        self.project_param = Some(param.to_string());
        self
    }

    /// Name the parameter carrying the addressed entity id
    pub fn entity_id(mut self, param: &str) -> Self {
        self.entity_param = Some(param.to_string());
        self
    }

    /// Mark the write idempotent (e.g. PUT-style replacements)
    pub fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }

    /// Override the derived endpoint name (shared cache keys with the
    /// typed client helpers)
    pub fn named_endpoint(mut self, name: &str) -> Self {
        self.endpoint.name = name.to_string();
        self
    }

    /// The tool never issues upstream writes
    pub fn read_only(&self) -> bool {
        self.endpoint.method.is_safe()
    }

    /// JSON schema describing the input object
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.ty.json_name(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        let mut schema = json!({
            "type": "object",
            "properties": Value::Object(properties),
        });
        if !required.is_empty() {
            schema["required"] = Value::Array(required);
        }
        schema
    }

    /// Wire descriptor for tools/list
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema(),
            annotations: ToolAnnotations {
                title: None,
                read_only_hint: Some(self.read_only()),
                destructive_hint: self.destructive.then_some(true),
                idempotent_hint: self.idempotent.then_some(true),
                open_world_hint: Some(true),
            },
            tags: self.tags.clone(),
        }
    }
}

/// Derive the upstream endpoint name from a tool name
fn endpoint_name(tool_name: &str) -> String {
    tool_name
        .strip_prefix("taiga_")
        .unwrap_or(tool_name)
        .to_string()
}

/// The one generic handler behind every REST shim: validate, bind, call.
pub struct EndpointTool {
    spec: Arc<ToolSpec>,
    client: Arc<CachedClient>,
}

impl EndpointTool {
    pub fn new(spec: Arc<ToolSpec>, client: Arc<CachedClient>) -> Self {
        Self { spec, client }
    }

    fn build_call(&self, args: &Value) -> TaigaResult<ApiCall> {
        let object = match args {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(TaigaError::invalid_input(
                    "arguments",
                    "tool arguments must be an object",
                ))
            }
        };

        // Validate declared parameters
        for param in &self.spec.params {
            match object.get(&param.name) {
                Some(Value::Null) | None if param.required => {
                    return Err(TaigaError::invalid_input(
                        &param.name,
                        "required parameter is missing",
                    ));
                }
                Some(Value::Null) | None => {}
                Some(value) => {
                    if !param.ty.matches(value) {
                        return Err(TaigaError::invalid_input(
                            &param.name,
                            format!("expected {}", param.ty.json_name()),
                        ));
                    }
                }
            }
        }

        // Bind path template variables
        let path_vars: Vec<(&str, &Value)> = self
            .spec
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::Path)
            .filter_map(|p| object.get(&p.name).map(|v| (p.name.as_str(), v)))
            .collect();
        let path = self.spec.endpoint.bind_path(&path_vars)?;

        // Collect query parameters
        let query: Vec<(String, String)> = self
            .spec
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::Query)
            .filter_map(|p| {
                object
                    .get(&p.name)
                    .filter(|v| !v.is_null())
                    .map(|v| (p.name.clone(), scalar_string(v)))
            })
            .collect();

        // Collect the body object
        let body_fields: Map<String, Value> = self
            .spec
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::Body)
            .filter_map(|p| {
                object
                    .get(&p.name)
                    .filter(|v| !v.is_null())
                    .map(|v| (p.name.clone(), v.clone()))
            })
            .collect();
        let body = if body_fields.is_empty() && self.spec.endpoint.method.is_safe() {
            None
        } else if body_fields.is_empty() && self.spec.endpoint.method == HttpMethod::Delete {
            None
        } else if body_fields.is_empty() {
            Some(Value::Object(Map::new()))
        } else {
            Some(Value::Object(body_fields))
        };

        let mut call = ApiCall::new(self.spec.endpoint.clone(), path);
        call.query = query;
        call.body = body;
        call.project_id = self
            .spec
            .project_param
            .as_ref()
            .and_then(|name| object.get(name))
            .and_then(Value::as_i64);
        call.entity_id = self
            .spec
            .entity_param
            .as_ref()
            .and_then(|name| object.get(name))
            .and_then(Value::as_i64);

        Ok(call)
    }
}

#[async_trait]
impl ToolHandler for EndpointTool {
    async fn call(&self, args: Value, _ctx: &InvocationContext) -> TaigaResult<Value> {
        let call = self.build_call(&args)?;
        self.client.execute(&call).await
    }
}

/// Render a scalar (or scalar array) as a query string value
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(scalar_string)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Register one shim spec with the generic handler
pub fn register_spec(
    registry: &mut ToolRegistry,
    client: Arc<CachedClient>,
    spec: ToolSpec,
) -> McpResult<()> {
    let descriptor = spec.descriptor();
    let safe_method = spec.endpoint.method.is_safe();
    let handler = Arc::new(EndpointTool::new(Arc::new(spec), client));

    registry.register(RegisteredTool {
        descriptor,
        safe_method,
        handler,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::InvocationKind;
    use taiga_client::{AuthManager, Credentials, MockTransport, TaigaClient};
    use taiga_config::CacheConfig;

    fn cached_client(mock: Arc<MockTransport>) -> Arc<CachedClient> {
        let auth = Arc::new(AuthManager::new(
            mock.clone(),
            Credentials::StaticToken("t".to_string()),
            Duration::from_secs(300),
        ));
        let client = Arc::new(TaigaClient::new(mock, auth));
        Arc::new(CachedClient::new(client, &CacheConfig::default()))
    }

    fn get_story_spec() -> ToolSpec {
        ToolSpec::read("taiga_get_user_story", "Get a user story by id", "/userstories/{id}")
            .tags(&["userstories", "get"])
            .path_i64("id", "User story id")
            .entity_id("id")
    }

    #[test]
    fn test_schema_shape() {
        let spec = ToolSpec::read("taiga_list_user_stories", "List user stories", "/userstories")
            .query("project", ParamType::Integer, true, "Project id")
            .query("milestone", ParamType::Integer, false, "Filter by milestone id");

        let schema = spec.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["project"]["type"], "integer");
        assert_eq!(
            schema["properties"]["milestone"]["description"],
            "Filter by milestone id"
        );
        assert_eq!(schema["required"], json!(["project"]));
    }

    #[test]
    fn test_descriptor_annotations() {
        let read = get_story_spec().descriptor();
        assert_eq!(read.annotations.read_only_hint, Some(true));
        assert_eq!(read.annotations.idempotent_hint, Some(true));
        assert_eq!(read.annotations.open_world_hint, Some(true));
        assert_eq!(read.annotations.destructive_hint, None);

        let delete = ToolSpec::delete("taiga_delete_project", "Delete a project", "/projects/{id}")
            .path_i64("id", "Project id")
            .descriptor();
        assert_eq!(delete.annotations.destructive_hint, Some(true));
        assert_eq!(delete.annotations.read_only_hint, Some(false));
        assert_eq!(delete.annotations.idempotent_hint, None);
    }

    #[tokio::test]
    async fn test_missing_required_param_is_invalid_input() {
        let mock = Arc::new(MockTransport::new());
        let handler = EndpointTool::new(Arc::new(get_story_spec()), cached_client(mock.clone()));
        let ctx = InvocationContext::new(InvocationKind::Tool, "taiga_get_user_story", Duration::from_secs(5));

        let result = handler.call(json!({}), &ctx).await;
        match result {
            Err(TaigaError::InvalidInput { field, .. }) => assert_eq!(field, "id"),
            other => panic!("unexpected: {:?}", other),
        }
        // Nothing reached upstream
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_type_mismatch_is_invalid_input() {
        let mock = Arc::new(MockTransport::new());
        let handler = EndpointTool::new(Arc::new(get_story_spec()), cached_client(mock));
        let ctx = InvocationContext::new(InvocationKind::Tool, "taiga_get_user_story", Duration::from_secs(5));

        let result = handler.call(json!({"id": "not-a-number"}), &ctx).await;
        assert!(matches!(result, Err(TaigaError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_path_query_and_body_binding() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(HttpMethod::Patch, "/userstories/42", json!({"id": 42}));

        let spec = ToolSpec::write(
            "taiga_update_user_story",
            "Update a user story",
            HttpMethod::Patch,
            "/userstories/{id}",
        )
        .path_i64("id", "User story id")
        .body("subject", ParamType::String, false, "New subject")
        .body("version", ParamType::Integer, true, "Current version")
        .entity_id("id");

        let handler = EndpointTool::new(Arc::new(spec), cached_client(mock.clone()));
        let ctx = InvocationContext::new(InvocationKind::Tool, "taiga_update_user_story", Duration::from_secs(5));

        handler
            .call(json!({"id": 42, "subject": "new", "version": 3}), &ctx)
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/userstories/42");
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body["subject"], "new");
        assert_eq!(body["version"], 3);
        // Path params never leak into the body
        assert!(body.get("id").is_none());
    }

    #[tokio::test]
    async fn test_query_array_renders_comma_separated() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(HttpMethod::Get, "/issues", json!([]));

        let spec = ToolSpec::read("taiga_list_issues", "List issues", "/issues")
            .query("project", ParamType::Integer, false, "Project id")
            .query("status", ParamType::Array, false, "Status ids");

        let handler = EndpointTool::new(Arc::new(spec), cached_client(mock.clone()));
        let ctx = InvocationContext::new(InvocationKind::Tool, "taiga_list_issues", Duration::from_secs(5));

        handler
            .call(json!({"project": 7, "status": [1, 2, 3]}), &ctx)
            .await
            .unwrap();

        let requests = mock.requests();
        let query = &requests[0].query;
        assert!(query.contains(&("project".to_string(), "7".to_string())));
        assert!(query.contains(&("status".to_string(), "1,2,3".to_string())));
    }
}
