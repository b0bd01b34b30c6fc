//! Authenticated Taiga API client

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{AuthManager, AuthSession, AuthStatus};
use crate::endpoint::{ApiCall, Endpoint};
use crate::errors::{TaigaError, TaigaResult};
use crate::models::{Project, ProjectStats, User};
use crate::transport::{ApiRequest, HttpMethod, TaigaTransport};

/// Stateless-looking façade over the upstream REST API.
///
/// Consults the token cache per request, submits through the transport, and
/// normalises upstream failures into the error taxonomy.
pub struct TaigaClient {
    transport: Arc<dyn TaigaTransport>,
    auth: Arc<AuthManager>,
}

impl TaigaClient {
    /// Create a client over the given transport and token cache
    pub fn new(transport: Arc<dyn TaigaTransport>, auth: Arc<AuthManager>) -> Self {
        Self { transport, auth }
    }

    /// The token cache backing this client
    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    /// Execute one bound call and decode the response
    pub async fn execute(&self, call: &ApiCall) -> TaigaResult<Value> {
        let bearer = if call.endpoint.name.starts_with("auth") {
            None
        } else {
            Some(self.auth.get_valid_token().await?)
        };

        let request = ApiRequest {
            method: call.endpoint.method,
            path: call.path.clone(),
            query: call.query.clone(),
            body: call.body.clone(),
            bearer,
        };

        debug!(endpoint = %call.endpoint.name, "Calling upstream");
        let response = self.transport.execute(request).await?;

        if response.status == 401 {
            self.auth.invalidate().await;
        }

        if response.is_success() {
            Ok(response.body)
        } else {
            Err(TaigaError::from_status(
                response.status,
                &response.body,
                &call.endpoint.name,
                response.retry_after,
            ))
        }
    }

    /// Convenience GET for a fixed path
    async fn get_value(&self, name: &str, path: String) -> TaigaResult<Value> {
        let endpoint = Endpoint::new(name, HttpMethod::Get, path.clone());
        let call = ApiCall::new(endpoint, path);
        self.execute(&call).await
    }

    /// Current user profile (`/users/me`)
    pub async fn me(&self) -> TaigaResult<User> {
        let value = self.get_value("users_me", "/users/me".to_string()).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// One project by id
    pub async fn project(&self, project_id: i64) -> TaigaResult<Project> {
        let value = self
            .get_value("projects_get", format!("/projects/{}", project_id))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Project statistics
    pub async fn project_stats(&self, project_id: i64) -> TaigaResult<ProjectStats> {
        let value = self
            .get_value("projects_stats", format!("/projects/{}/stats", project_id))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Project modules configuration
    pub async fn project_modules(&self, project_id: i64) -> TaigaResult<Value> {
        self.get_value("projects_modules", format!("/projects/{}/modules", project_id))
            .await
    }

    /// Log in with explicit credentials
    pub async fn login(&self, username: &str, password: &str) -> TaigaResult<AuthSession> {
        self.auth.login(username, password).await
    }

    /// Force a token refresh
    pub async fn refresh_token(&self) -> TaigaResult<AuthSession> {
        self.auth.refresh_now().await
    }

    /// Drop the current session
    pub async fn logout(&self) {
        self.auth.logout().await
    }

    /// Authentication status snapshot
    pub async fn auth_status(&self) -> AuthStatus {
        self.auth.status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::transport::{ApiResponse, MockTransport};
    use serde_json::json;
    use std::time::Duration;

    fn client_with(mock: Arc<MockTransport>) -> TaigaClient {
        let auth = Arc::new(AuthManager::new(
            mock.clone(),
            Credentials::StaticToken("test-token".to_string()),
            Duration::from_secs(300),
        ));
        TaigaClient::new(mock, auth)
    }

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(HttpMethod::Get, "/users/me", json!({"id": 1, "username": "me"}));

        let client = client_with(mock.clone());
        let user = client.me().await.unwrap();
        assert_eq!(user.username, "me");

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].bearer.as_deref(), Some("test-token"));
    }

    #[tokio::test]
    async fn test_error_mapping_and_token_clear_on_401() {
        let mock = Arc::new(MockTransport::new());
        mock.enqueue(Ok(ApiResponse::status(401)));

        let client = client_with(mock.clone());
        let result = client.me().await;
        assert!(matches!(result, Err(TaigaError::Unauthenticated { .. })));

        // Cached static token cleared after upstream rejection
        assert!(!client.auth_status().await.authenticated);
    }

    #[tokio::test]
    async fn test_not_found_names_endpoint() {
        let mock = Arc::new(MockTransport::new());
        mock.enqueue(Ok(ApiResponse::status(404)));

        let client = client_with(mock);
        match client.project(999).await {
            Err(TaigaError::NotFound { resource }) => assert_eq!(resource, "projects_get"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_auth_endpoints_skip_bearer() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(
            HttpMethod::Post,
            "/auth",
            json!({"auth_token": "fresh", "refresh": "r"}),
        );

        let client = client_with(mock.clone());
        client.login("admin", "secret").await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].bearer.is_none());
    }
}
