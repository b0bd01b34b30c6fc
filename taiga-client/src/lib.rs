//! Authenticated Taiga REST client
//!
//! This crate provides the upstream half of the request pipeline: a pooled
//! HTTPS session, a token cache with proactive coalesced refresh, typed
//! error mapping, endpoint descriptors, and a caching wrapper that consults
//! the endpoint policy table and invalidates on writes.

pub mod auth;
pub mod cached;
pub mod client;
pub mod endpoint;
pub mod errors;
pub mod models;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use auth::{AuthManager, AuthSession, AuthStatus, Credentials};
pub use cached::{policy_ttl, CachedClient};
pub use client::TaigaClient;
pub use endpoint::{ApiCall, Endpoint, InvalidationScope};
pub use errors::{TaigaError, TaigaResult};
pub use session::{HttpSession, SessionCounters};
pub use transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, MockTransport, TaigaTransport};
