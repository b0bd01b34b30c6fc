//! Endpoint descriptors and cache key canonicalisation

use std::time::Duration;

use serde_json::Value;

use crate::errors::{TaigaError, TaigaResult};
use crate::transport::HttpMethod;

/// What a successful write invalidates in the response cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidationScope {
    /// Read endpoint or write with no cached counterpart
    #[default]
    None,
    /// Invalidate every key scoped to the affected project, plus keys
    /// referencing the touched entity id
    Project,
    /// Invalidate identity-scoped keys (login/logout)
    Identity,
}

/// Descriptor of one upstream REST endpoint
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Canonical endpoint name, e.g. `userstories_filters_data`
    pub name: String,

    /// HTTP method
    pub method: HttpMethod,

    /// Path template with `{var}` placeholders, e.g. `/userstories/{id}`
    pub path: String,

    /// TTL when the response is cacheable; `None` disables caching
    pub cache_ttl: Option<Duration>,

    /// Cache invalidation triggered by this endpoint on success
    pub invalidates: InvalidationScope,
}

impl Endpoint {
    /// Uncached endpoint
    pub fn new(name: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        let invalidates = if method.is_safe() {
            InvalidationScope::None
        } else {
            InvalidationScope::Project
        };
        Self {
            name: name.into(),
            method,
            path: path.into(),
            cache_ttl: None,
            invalidates,
        }
    }

    /// Cacheable GET endpoint
    pub fn cached_get(name: impl Into<String>, path: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            method: HttpMethod::Get,
            path: path.into(),
            cache_ttl: Some(ttl),
            invalidates: InvalidationScope::None,
        }
    }

    /// Override the invalidation scope
    pub fn invalidating(mut self, scope: InvalidationScope) -> Self {
        self.invalidates = scope;
        self
    }

    /// Whether responses from this endpoint may be cached
    pub fn is_cacheable(&self) -> bool {
        self.method == HttpMethod::Get && self.cache_ttl.is_some()
    }

    /// Bind `{var}` placeholders in the path template
    pub fn bind_path(&self, vars: &[(&str, &Value)]) -> TaigaResult<String> {
        let mut path = self.path.clone();
        for (name, value) in vars {
            let placeholder = format!("{{{}}}", name);
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(TaigaError::invalid_input(
                        *name,
                        format!("cannot use {} as a path parameter", other),
                    ))
                }
            };
            path = path.replace(&placeholder, &rendered);
        }

        if path.contains('{') {
            return Err(TaigaError::internal(format!(
                "unbound path parameter in '{}'",
                path
            )));
        }

        Ok(path)
    }
}

/// One bound call against an endpoint
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub endpoint: Endpoint,

    /// Path with all template variables bound
    pub path: String,

    /// Query parameters
    pub query: Vec<(String, String)>,

    /// JSON body for writes
    pub body: Option<Value>,

    /// Project scope when the call addresses one project
    pub project_id: Option<i64>,

    /// Entity id when the call addresses one entity
    pub entity_id: Option<i64>,
}

impl ApiCall {
    /// Call with nothing but the bound path
    pub fn new(endpoint: Endpoint, path: impl Into<String>) -> Self {
        Self {
            endpoint,
            path: path.into(),
            query: Vec::new(),
            body: None,
            project_id: None,
            entity_id: None,
        }
    }

    /// Canonical cache key: endpoint name, bound path, sorted query params,
    /// and project scope. Absent parameters are omitted so argument order
    /// never splits the cache.
    pub fn cache_key(&self) -> String {
        let mut params = self.query.clone();
        params.sort();

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let scope = self
            .project_id
            .map(|id| format!("project={}", id))
            .unwrap_or_default();

        format!("{}|{}|{}|{}", self.endpoint.name, self.path, query, scope)
    }
}

/// Pattern matching every cache key scoped to the given project
pub fn project_pattern(project_id: i64) -> String {
    format!(r"\|project={}$", project_id)
}

/// Pattern matching cache keys whose bound path references the entity id
pub fn entity_pattern(entity_id: i64) -> String {
    format!(r"/{}([/|]|$)", entity_id)
}

/// Pattern matching identity-scoped cache keys
pub fn identity_pattern() -> &'static str {
    r"^(users_me|timeline_user)\|"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bind_path() {
        let endpoint = Endpoint::new("userstories_get", HttpMethod::Get, "/userstories/{id}");
        let path = endpoint.bind_path(&[("id", &json!(42))]).unwrap();
        assert_eq!(path, "/userstories/42");
    }

    #[test]
    fn test_bind_path_rejects_unbound_vars() {
        let endpoint = Endpoint::new("userstories_get", HttpMethod::Get, "/userstories/{id}");
        assert!(endpoint.bind_path(&[]).is_err());
    }

    #[test]
    fn test_bind_path_rejects_object_params() {
        let endpoint = Endpoint::new("userstories_get", HttpMethod::Get, "/userstories/{id}");
        assert!(endpoint.bind_path(&[("id", &json!({"nested": 1}))]).is_err());
    }

    #[test]
    fn test_cache_key_sorts_query_params() {
        let endpoint = Endpoint::cached_get(
            "userstories_filters_data",
            "/userstories/filters_data",
            Duration::from_secs(60),
        );

        let mut a = ApiCall::new(endpoint.clone(), "/userstories/filters_data");
        a.query = vec![
            ("project".to_string(), "7".to_string()),
            ("milestone".to_string(), "3".to_string()),
        ];
        a.project_id = Some(7);

        let mut b = ApiCall::new(endpoint, "/userstories/filters_data");
        b.query = vec![
            ("milestone".to_string(), "3".to_string()),
            ("project".to_string(), "7".to_string()),
        ];
        b.project_id = Some(7);

        assert_eq!(a.cache_key(), b.cache_key());
        assert!(a.cache_key().ends_with("|project=7"));
    }

    #[test]
    fn test_project_pattern_matches_scoped_keys() {
        let re = regex_lite(&project_pattern(7));
        assert!(re(&ApiCall {
            endpoint: Endpoint::cached_get("projects_get", "/projects/{id}", Duration::from_secs(60)),
            path: "/projects/7".to_string(),
            query: vec![],
            body: None,
            project_id: Some(7),
            entity_id: None,
        }
        .cache_key()));
    }

    #[test]
    fn test_entity_pattern_does_not_match_prefixes() {
        let re = regex_lite(&entity_pattern(7));
        assert!(re("userstories_get|/userstories/7||project=3"));
        assert!(!re("userstories_get|/userstories/70||project=3"));
    }

    #[test]
    fn test_write_defaults_to_project_invalidation() {
        let endpoint = Endpoint::new("projects_update", HttpMethod::Patch, "/projects/{id}");
        assert_eq!(endpoint.invalidates, InvalidationScope::Project);

        let read = Endpoint::new("projects_list", HttpMethod::Get, "/projects");
        assert_eq!(read.invalidates, InvalidationScope::None);
    }

    fn regex_lite(pattern: &str) -> impl Fn(&str) -> bool {
        let re = regex::Regex::new(pattern).unwrap();
        move |s: &str| re.is_match(s)
    }
}
