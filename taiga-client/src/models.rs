//! Typed values for the upstream payloads the server inspects
//!
//! Most tool responses pass through as decoded JSON; only the payloads the
//! resources and auth flow look into get typed representations. Unknown
//! fields are preserved via `extra`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Tokens returned by `/auth` and `/auth/refresh`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    /// Bearer token
    pub auth_token: String,

    /// Refresh token, absent for application tokens
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Authenticated user profile (`/users/me`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,

    #[serde(default)]
    pub full_name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Project summary (`/projects/{id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub slug: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Project statistics (`/projects/{id}/stats`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStats {
    #[serde(default)]
    pub total_points: Option<f64>,

    #[serde(default)]
    pub closed_points: Option<f64>,

    #[serde(default)]
    pub total_milestones: Option<u32>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}
