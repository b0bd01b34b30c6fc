//! Caching wrapper over the Taiga client

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use taiga_caching::{CacheStats, MemoryCache};
use taiga_config::CacheConfig;

use crate::client::TaigaClient;
use crate::endpoint::{entity_pattern, identity_pattern, project_pattern, ApiCall, InvalidationScope};
use crate::errors::TaigaResult;
use crate::models::{Project, ProjectStats, User};

/// Endpoint TTLs for the cacheable read families
///
/// Listings of stories, issues and tasks change too often to cache; only
/// slow-moving configuration and metrics endpoints are listed here.
pub mod ttl {
    use std::time::Duration;

    /// `*/filters_data` - stable per project
    pub const FILTERS_DATA: Duration = Duration::from_secs(30 * 60);

    /// `projects/{id}/modules` - configuration
    pub const PROJECT_MODULES: Duration = Duration::from_secs(30 * 60);

    /// `projects/{id}/stats` and friends - slow-moving metrics
    pub const STATS: Duration = Duration::from_secs(5 * 60);

    /// `users/me` - profile stable
    pub const CURRENT_USER: Duration = Duration::from_secs(10 * 60);

    /// `memberships` listing - changes rare
    pub const MEMBERSHIPS: Duration = Duration::from_secs(10 * 60);
}

/// Client wrapper consulting the memory cache for whitelisted reads and
/// invalidating affected keys after writes.
pub struct CachedClient {
    client: Arc<TaigaClient>,
    cache: Option<Arc<MemoryCache<Value>>>,
    default_ttl: Duration,
}

impl CachedClient {
    /// Wrap a client; a disabled cache config yields a pass-through wrapper
    pub fn new(client: Arc<TaigaClient>, config: &CacheConfig) -> Self {
        let cache = config
            .enabled
            .then(|| Arc::new(MemoryCache::new(config.max_entries, config.default_ttl)));

        Self {
            client,
            cache,
            default_ttl: config.default_ttl,
        }
    }

    /// The wrapped client
    pub fn inner(&self) -> &Arc<TaigaClient> {
        &self.client
    }

    /// Execute one bound call through the cache
    pub async fn execute(&self, call: &ApiCall) -> TaigaResult<Value> {
        let cache = match &self.cache {
            Some(cache) => cache,
            None => return self.client.execute(call).await,
        };

        if call.endpoint.is_cacheable() {
            let key = call.cache_key();
            if let Some(value) = cache.get(&key) {
                debug!(endpoint = %call.endpoint.name, "Cache hit");
                return Ok(value);
            }

            let value = self.client.execute(call).await?;
            let ttl = call.endpoint.cache_ttl.unwrap_or(self.default_ttl);
            cache.set_with_ttl(key, value.clone(), ttl);
            return Ok(value);
        }

        let value = self.client.execute(call).await?;

        // Invalidate synchronously before the write returns to the caller so
        // later reads from this client are authoritative.
        self.invalidate_for(call, cache);

        Ok(value)
    }

    fn invalidate_for(&self, call: &ApiCall, cache: &MemoryCache<Value>) {
        match call.endpoint.invalidates {
            InvalidationScope::None => {}
            InvalidationScope::Project => {
                if let Some(project_id) = call.project_id {
                    self.invalidate_pattern(cache, &project_pattern(project_id));
                }
                if let Some(entity_id) = call.entity_id {
                    self.invalidate_pattern(cache, &entity_pattern(entity_id));
                }
            }
            InvalidationScope::Identity => {
                self.invalidate_pattern(cache, identity_pattern());
            }
        }
    }

    fn invalidate_pattern(&self, cache: &MemoryCache<Value>, pattern: &str) {
        match cache.invalidate(pattern) {
            Ok(count) if count > 0 => debug!(pattern, count, "Invalidated cache entries"),
            Ok(_) => {}
            Err(e) => warn!(pattern, "Cache invalidation failed: {}", e),
        }
    }

    /// Current cache statistics; zeros when the cache is disabled
    pub fn stats(&self) -> CacheStats {
        self.cache
            .as_ref()
            .map(|cache| cache.stats())
            .unwrap_or_default()
    }

    /// Remove every cached entry, returning the removed count
    pub fn clear_all(&self) -> usize {
        self.cache.as_ref().map(|cache| cache.clear()).unwrap_or(0)
    }

    /// Remove entries scoped to one project, returning the removed count
    pub fn clear_project(&self, project_id: i64) -> usize {
        self.cache
            .as_ref()
            .and_then(|cache| cache.invalidate(&project_pattern(project_id)).ok())
            .unwrap_or(0)
    }

    /// Remove identity-scoped entries (used by logout)
    pub fn clear_identity(&self) -> usize {
        self.cache
            .as_ref()
            .and_then(|cache| cache.invalidate(identity_pattern()).ok())
            .unwrap_or(0)
    }

    /// Current user profile, cached per the `users/me` policy
    pub async fn me(&self) -> TaigaResult<User> {
        use crate::endpoint::Endpoint;
        let endpoint = Endpoint::cached_get("users_me", "/users/me", ttl::CURRENT_USER);
        let call = ApiCall::new(endpoint, "/users/me");
        let value = self.execute(&call).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Project summary (uncached; listings change too often)
    pub async fn project(&self, project_id: i64) -> TaigaResult<Project> {
        self.client.project(project_id).await
    }

    /// Project statistics, cached per the stats policy
    pub async fn project_stats(&self, project_id: i64) -> TaigaResult<ProjectStats> {
        use crate::endpoint::Endpoint;
        let endpoint = Endpoint::cached_get("projects_stats", "/projects/{id}/stats", ttl::STATS);
        let mut call = ApiCall::new(endpoint, format!("/projects/{}/stats", project_id));
        call.project_id = Some(project_id);
        let value = self.execute(&call).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Project modules configuration, cached per the modules policy
    pub async fn project_modules(&self, project_id: i64) -> TaigaResult<Value> {
        use crate::endpoint::Endpoint;
        let endpoint = Endpoint::cached_get(
            "projects_modules",
            "/projects/{id}/modules",
            ttl::PROJECT_MODULES,
        );
        let mut call = ApiCall::new(endpoint, format!("/projects/{}/modules", project_id));
        call.project_id = Some(project_id);
        let value = self.execute(&call).await?;
        Ok(value)
    }

    /// Logout: drop the session and identity-scoped cache entries
    pub async fn logout(&self) {
        self.client.logout().await;
        let cleared = self.clear_identity();
        if cleared > 0 {
            debug!(cleared, "Cleared identity-scoped cache entries on logout");
        }
    }
}

/// Default TTL for a cacheable endpoint family by name suffix
pub fn policy_ttl(endpoint_name: &str) -> Option<Duration> {
    if endpoint_name.ends_with("filters_data") {
        Some(ttl::FILTERS_DATA)
    } else if endpoint_name == "projects_modules" {
        Some(ttl::PROJECT_MODULES)
    } else if endpoint_name.ends_with("_stats") {
        Some(ttl::STATS)
    } else if endpoint_name == "users_me" {
        Some(ttl::CURRENT_USER)
    } else if endpoint_name == "memberships_list" {
        Some(ttl::MEMBERSHIPS)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthManager, Credentials};
    use crate::endpoint::Endpoint;
    use crate::transport::{HttpMethod, MockTransport};
    use serde_json::json;

    fn cached_client(mock: Arc<MockTransport>) -> CachedClient {
        let auth = Arc::new(AuthManager::new(
            mock.clone(),
            Credentials::StaticToken("test-token".to_string()),
            Duration::from_secs(300),
        ));
        let client = Arc::new(TaigaClient::new(mock, auth));
        CachedClient::new(client, &CacheConfig::default())
    }

    fn filters_call(project_id: i64) -> ApiCall {
        let endpoint = Endpoint::cached_get(
            "userstories_filters_data",
            "/userstories/filters_data",
            ttl::FILTERS_DATA,
        );
        let mut call = ApiCall::new(endpoint, "/userstories/filters_data");
        call.query = vec![("project".to_string(), project_id.to_string())];
        call.project_id = Some(project_id);
        call
    }

    fn update_project_call(project_id: i64) -> ApiCall {
        let endpoint = Endpoint::new(
            "projects_update",
            HttpMethod::Patch,
            "/projects/{id}",
        );
        let mut call = ApiCall::new(endpoint, format!("/projects/{}", project_id));
        call.body = Some(json!({"name": "renamed"}));
        call.project_id = Some(project_id);
        call.entity_id = Some(project_id);
        call
    }

    #[tokio::test]
    async fn test_second_read_served_from_cache() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(
            HttpMethod::Get,
            "/userstories/filters_data",
            json!({"statuses": []}),
        );

        let client = cached_client(mock.clone());
        let call = filters_call(7);

        client.execute(&call).await.unwrap();
        client.execute(&call).await.unwrap();

        // Upstream hit exactly once
        assert_eq!(mock.request_count(HttpMethod::Get, "/userstories/filters_data"), 1);

        let stats = client.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test]
    async fn test_write_invalidates_project_scope() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(
            HttpMethod::Get,
            "/userstories/filters_data",
            json!({"statuses": []}),
        );
        mock.add_mock(HttpMethod::Patch, "/projects/7", json!({"id": 7, "name": "renamed"}));

        let client = cached_client(mock.clone());

        // Prime the cache
        client.execute(&filters_call(7)).await.unwrap();
        assert_eq!(client.stats().size, 1);

        // Successful write drops project-scoped keys
        client.execute(&update_project_call(7)).await.unwrap();
        assert_eq!(client.stats().size, 0);

        // Next read goes upstream again
        client.execute(&filters_call(7)).await.unwrap();
        assert_eq!(mock.request_count(HttpMethod::Get, "/userstories/filters_data"), 2);
    }

    #[tokio::test]
    async fn test_write_leaves_other_projects_cached() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(
            HttpMethod::Get,
            "/userstories/filters_data",
            json!({"statuses": []}),
        );
        mock.add_mock(HttpMethod::Patch, "/projects/7", json!({"id": 7}));

        let client = cached_client(mock.clone());

        client.execute(&filters_call(7)).await.unwrap();
        client.execute(&filters_call(8)).await.unwrap();
        assert_eq!(client.stats().size, 2);

        client.execute(&update_project_call(7)).await.unwrap();

        // Project 8 entry survives
        client.execute(&filters_call(8)).await.unwrap();
        assert_eq!(mock.request_count(HttpMethod::Get, "/userstories/filters_data"), 2);
    }

    #[tokio::test]
    async fn test_failed_write_does_not_invalidate() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(
            HttpMethod::Get,
            "/userstories/filters_data",
            json!({"statuses": []}),
        );

        let client = cached_client(mock.clone());
        client.execute(&filters_call(7)).await.unwrap();

        // No mock for the PATCH: upstream responds 404, the write fails
        let result = client.execute(&update_project_call(7)).await;
        assert!(result.is_err());

        assert_eq!(client.stats().size, 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_passes_through() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(
            HttpMethod::Get,
            "/userstories/filters_data",
            json!({"statuses": []}),
        );

        let auth = Arc::new(AuthManager::new(
            mock.clone(),
            Credentials::StaticToken("t".to_string()),
            Duration::from_secs(300),
        ));
        let client = Arc::new(TaigaClient::new(mock.clone(), auth));
        let cached = CachedClient::new(
            client,
            &CacheConfig {
                enabled: false,
                ..Default::default()
            },
        );

        cached.execute(&filters_call(7)).await.unwrap();
        cached.execute(&filters_call(7)).await.unwrap();

        assert_eq!(mock.request_count(HttpMethod::Get, "/userstories/filters_data"), 2);
        assert_eq!(cached.stats().size, 0);
    }

    #[tokio::test]
    async fn test_clear_project_and_clear_all() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(
            HttpMethod::Get,
            "/userstories/filters_data",
            json!({"statuses": []}),
        );

        let client = cached_client(mock);
        client.execute(&filters_call(7)).await.unwrap();
        client.execute(&filters_call(8)).await.unwrap();

        assert_eq!(client.clear_project(7), 1);
        assert_eq!(client.stats().size, 1);

        assert_eq!(client.clear_all(), 1);
        assert_eq!(client.stats().size, 0);
    }

    #[test]
    fn test_policy_ttls() {
        assert_eq!(policy_ttl("userstories_filters_data"), Some(ttl::FILTERS_DATA));
        assert_eq!(policy_ttl("projects_modules"), Some(ttl::PROJECT_MODULES));
        assert_eq!(policy_ttl("projects_stats"), Some(ttl::STATS));
        assert_eq!(policy_ttl("users_me"), Some(ttl::CURRENT_USER));
        assert_eq!(policy_ttl("memberships_list"), Some(ttl::MEMBERSHIPS));
        // Fast-changing listings stay uncached
        assert_eq!(policy_ttl("userstories_list"), None);
        assert_eq!(policy_ttl("issues_get"), None);
    }
}
