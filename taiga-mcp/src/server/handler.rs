//! Request handler for MCP server operations

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use taiga_client::TaigaError;

use crate::context::{InvocationContext, InvocationKind};
use crate::error::{McpError, McpResult};
use crate::middleware::{EndpointFuture, MiddlewareChain};
use crate::protocol::{
    negotiate_protocol_version, InitializeParams, InitializeResult, PromptsGetParams,
    PromptsGetResult, PromptsListResult, ResourceContent, ResourcesListResult,
    ResourcesReadParams, ResourcesReadResult, ServerCapabilities, ServerInfo, ToolsCallParams,
    ToolsCallResult, ToolsListResult,
};
use crate::registry::{PromptRegistry, ResourceRegistry, ToolRegistry};

/// Handler for MCP operations: decodes params, runs the middleware chain,
/// encodes results.
pub struct McpRequestHandler {
    tools: Arc<ToolRegistry>,
    resources: Arc<ResourceRegistry>,
    prompts: Arc<PromptRegistry>,
    chain: Arc<MiddlewareChain>,
    request_timeout: Duration,
    production: bool,
}

impl McpRequestHandler {
    pub fn new(
        tools: Arc<ToolRegistry>,
        resources: Arc<ResourceRegistry>,
        prompts: Arc<PromptRegistry>,
        chain: Arc<MiddlewareChain>,
        request_timeout: Duration,
        production: bool,
    ) -> Self {
        Self {
            tools,
            resources,
            prompts,
            chain,
            request_timeout,
            production,
        }
    }

    /// Whether error detail is masked
    pub fn production(&self) -> bool {
        self.production
    }

    /// Handle initialize
    pub fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let params: InitializeParams = decode_params("initialize", params)?;

        let result = InitializeResult {
            protocol_version: negotiate_protocol_version(&params.protocol_version),
            capabilities: ServerCapabilities::full(),
            server_info: ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle tools/list
    pub fn handle_tools_list(&self) -> McpResult<Value> {
        let result = ToolsListResult {
            tools: self.tools.descriptors(),
            next_cursor: None,
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle tools/call: pipeline failures become protocol-level tool
    /// errors, not JSON-RPC errors.
    pub async fn handle_tools_call(&self, params: Option<Value>) -> McpResult<Value> {
        let params: ToolsCallParams = decode_params("tools/call", params)?;
        let args = params.arguments.unwrap_or_else(|| json!({}));

        let result = match self.tools.get(&params.name) {
            Some(tool) => {
                let ctx = InvocationContext::new(
                    InvocationKind::Tool,
                    params.name.clone(),
                    self.request_timeout,
                )
                .with_hints(tool.read_only(), tool.idempotent(), tool.safe_method);

                let handler = tool.handler.clone();
                let call_args = args.clone();
                let call_ctx = ctx.clone();
                let endpoint = move || -> EndpointFuture {
                    let handler = handler.clone();
                    let args = call_args.clone();
                    let ctx = call_ctx.clone();
                    Box::pin(async move { handler.call(args, &ctx).await })
                };

                match self.chain.dispatch(&ctx, &args, &endpoint).await {
                    Ok(value) => ToolsCallResult::json(&value),
                    Err(e) => self.tool_error(&ctx, e),
                }
            }
            None => {
                let ctx = InvocationContext::new(
                    InvocationKind::Tool,
                    params.name.clone(),
                    self.request_timeout,
                );
                let e = self.dispatch_not_found(&ctx, &args).await;
                self.tool_error(&ctx, e)
            }
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle resources/list
    pub fn handle_resources_list(&self) -> McpResult<Value> {
        let result = ResourcesListResult {
            resources: self.resources.descriptors(),
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle resources/read
    pub async fn handle_resources_read(&self, params: Option<Value>) -> McpResult<Value> {
        let params: ResourcesReadParams = decode_params("resources/read", params)?;

        let (resource, bound) = match self.resources.resolve(&params.uri) {
            Some(resolved) => resolved,
            None => {
                let ctx = InvocationContext::new(
                    InvocationKind::Resource,
                    params.uri.clone(),
                    self.request_timeout,
                );
                let e = self.dispatch_not_found(&ctx, &json!({})).await;
                return Err(McpError::Pipeline(e));
            }
        };

        let ctx = InvocationContext::new(
            InvocationKind::Resource,
            params.uri.clone(),
            self.request_timeout,
        )
        .with_hints(true, true, true);

        let handler = resource.handler.clone();
        let call_ctx = ctx.clone();
        let args = serde_json::to_value(&bound)?;
        let endpoint = move || -> EndpointFuture {
            let handler = handler.clone();
            let params = bound.clone();
            let ctx = call_ctx.clone();
            Box::pin(async move { handler.read(params, &ctx).await })
        };

        let value = self.chain.dispatch(&ctx, &args, &endpoint).await?;

        let result = ResourcesReadResult {
            contents: vec![ResourceContent {
                uri: params.uri,
                mime_type: resource
                    .descriptor
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| "application/json".to_string()),
                text: serde_json::to_string_pretty(&value)?,
            }],
        };

        Ok(serde_json::to_value(result)?)
    }

    /// Handle prompts/list
    pub fn handle_prompts_list(&self) -> McpResult<Value> {
        let result = PromptsListResult {
            prompts: self.prompts.descriptors(),
        };
        Ok(serde_json::to_value(result)?)
    }

    /// Handle prompts/get
    pub async fn handle_prompts_get(&self, params: Option<Value>) -> McpResult<Value> {
        let params: PromptsGetParams = decode_params("prompts/get", params)?;

        let prompt = match self.prompts.get(&params.name) {
            Some(prompt) => prompt,
            None => {
                let ctx = InvocationContext::new(
                    InvocationKind::Prompt,
                    params.name.clone(),
                    self.request_timeout,
                );
                let e = self.dispatch_not_found(&ctx, &json!({})).await;
                return Err(McpError::Pipeline(e));
            }
        };

        let ctx = InvocationContext::new(
            InvocationKind::Prompt,
            params.name.clone(),
            self.request_timeout,
        )
        .with_hints(true, true, true);

        let handler = prompt.handler.clone();
        let arguments = params.arguments.clone();
        let args = serde_json::to_value(&params.arguments)?;
        let endpoint = move || -> EndpointFuture {
            let handler = handler.clone();
            let arguments = arguments.clone();
            Box::pin(async move {
                handler
                    .render(&arguments)
                    .map(Value::String)
            })
        };

        let rendered = self.chain.dispatch(&ctx, &args, &endpoint).await?;
        let text = rendered
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| rendered.to_string());

        let result =
            PromptsGetResult::user_text(prompt.descriptor.description.clone(), text);
        Ok(serde_json::to_value(result)?)
    }

    /// Run an unknown-name failure through the middleware chain. The chain
    /// wraps every invocation, so even a `NotFound` gets a correlation id
    /// and the start/end log records.
    async fn dispatch_not_found(&self, ctx: &InvocationContext, args: &Value) -> TaigaError {
        let target = ctx.target.clone();
        let endpoint = move || -> EndpointFuture {
            let target = target.clone();
            Box::pin(async move { Err(TaigaError::not_found(target)) })
        };

        match self.chain.dispatch(ctx, args, &endpoint).await {
            Ok(_) => TaigaError::not_found(ctx.target.clone()),
            Err(e) => e,
        }
    }

    /// Render a pipeline failure as a tool error with a stable kind tag and
    /// no sensitive detail.
    fn tool_error(&self, ctx: &InvocationContext, error: TaigaError) -> ToolsCallResult {
        ToolsCallResult::error(format!(
            "{}: {} (correlation id {})",
            error.kind(),
            error.public_message(self.production),
            ctx.correlation_id
        ))
    }
}

fn decode_params<T: serde::de::DeserializeOwned>(
    method: &str,
    params: Option<Value>,
) -> McpResult<T> {
    let params = params.ok_or_else(|| McpError::invalid_params(method, "missing parameters"))?;
    serde_json::from_value(params).map_err(|e| McpError::invalid_params(method, e.to_string()))
}
