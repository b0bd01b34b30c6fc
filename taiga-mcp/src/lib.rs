//! # Taiga MCP Server
//!
//! A Model Context Protocol server exposing the Taiga project-management
//! REST API as a catalog of tools, resources and prompts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │   MCP client        │
//! │  (LLM host)         │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┴──────┐
//!     │  Transport  │
//!     │ (stdio/http)│
//!     └──────┬──────┘
//!            │
//! ┌──────────▼──────────┐
//! │  McpServer          │
//! │  ┌───────────────┐  │
//! │  │  Registries   │  │
//! │  └───────┬───────┘  │
//! │  ┌───────▼───────┐  │
//! │  │  Middleware   │  │  error handling → rate limit → timing → logging
//! │  └───────┬───────┘  │
//! └──────────┼──────────┘
//!            │
//!     ┌──────┴──────────┐
//!     │  CachedClient   │
//!     │  TaigaClient    │
//!     │  HttpSession    │
//!     └─────────────────┘
//! ```

pub mod context;
pub mod error;
pub mod middleware;
pub mod prompts;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod server;
pub mod service;
pub mod tools;

// Re-export commonly used types
pub use context::{InvocationContext, InvocationKind};
pub use error::{McpError, McpResult};
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use registry::{PromptRegistry, ResourceRegistry, ToolRegistry};
pub use server::{McpRequestHandler, McpServer};
pub use service::McpService;
