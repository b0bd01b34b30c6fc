//! Auth token cache with proactive, coalesced refresh

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use taiga_config::UpstreamConfig;

use crate::errors::{TaigaError, TaigaResult};
use crate::models::AuthTokens;
use crate::transport::{ApiRequest, HttpMethod, TaigaTransport};

/// Assumed lifetime of a password-issued token; Taiga does not report one
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(8 * 60 * 60);

/// Credential source for establishing a session
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Username/password login via `/auth`
    Password { username: String, password: String },

    /// Pre-issued token; never refreshed, never expires locally
    StaticToken(String),

    /// No ambient credentials; a client must call the login tool
    None,
}

impl From<&UpstreamConfig> for Credentials {
    fn from(config: &UpstreamConfig) -> Self {
        if let Some(token) = &config.auth_token {
            Credentials::StaticToken(token.clone())
        } else if let (Some(username), Some(password)) = (&config.username, &config.password) {
            Credentials::Password {
                username: username.clone(),
                password: password.clone(),
            }
        } else {
            Credentials::None
        }
    }
}

/// One authenticated session against the upstream
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Bearer token
    pub access_token: String,

    /// Refresh token when the upstream issued one
    pub refresh_token: Option<String>,

    /// Expiry; `None` for static tokens that never expire locally
    pub expires_at: Option<DateTime<Utc>>,

    /// When the session was established
    pub issued_at: DateTime<Utc>,
}

impl AuthSession {
    fn from_tokens(tokens: AuthTokens, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            access_token: tokens.auth_token,
            refresh_token: tokens.refresh,
            expires_at: Some(now + ChronoDuration::from_std(lifetime).unwrap_or(ChronoDuration::hours(8))),
            issued_at: now,
        }
    }

    fn from_static_token(token: String) -> Self {
        Self {
            access_token: token,
            refresh_token: None,
            expires_at: None,
            issued_at: Utc::now(),
        }
    }

    /// Remaining lifetime; `None` means unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|exp| (exp - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }

    /// Whether the token has passed its absolute validity
    pub fn is_expired(&self) -> bool {
        matches!(self.remaining(), Some(d) if d.is_zero())
    }
}

/// Authentication status snapshot
#[derive(Debug, Clone)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Single-entry token cache.
///
/// All reads and refreshes happen under one async mutex, so concurrent
/// callers racing on a near-expiry token coalesce onto a single refresh.
pub struct AuthManager {
    transport: Arc<dyn TaigaTransport>,
    credentials: Credentials,
    session: Mutex<Option<AuthSession>>,
    refresh_threshold: Duration,
}

impl AuthManager {
    /// Create a manager with the given ambient credentials
    pub fn new(
        transport: Arc<dyn TaigaTransport>,
        credentials: Credentials,
        refresh_threshold: Duration,
    ) -> Self {
        Self {
            transport,
            credentials,
            session: Mutex::new(None),
            refresh_threshold,
        }
    }

    /// Return a token whose expiry is beyond now, refreshing or logging in
    /// as needed.
    pub async fn get_valid_token(&self) -> TaigaResult<String> {
        let mut guard = self.session.lock().await;

        if let Some(current) = guard.clone() {
            match current.remaining() {
                // Static tokens never expire locally
                None => return Ok(current.access_token),

                Some(remaining) if remaining > self.refresh_threshold => {
                    return Ok(current.access_token);
                }

                Some(_) => {
                    if let Some(refresh_token) = current.refresh_token.clone() {
                        match self.refresh(&refresh_token).await {
                            Ok(renewed) => {
                                debug!("Token refreshed proactively");
                                let token = renewed.access_token.clone();
                                *guard = Some(renewed);
                                return Ok(token);
                            }
                            Err(e) if !current.is_expired() => {
                                // Still within absolute validity: serve stale
                                warn!("Token refresh failed, serving current token: {}", e);
                                return Ok(current.access_token);
                            }
                            Err(e) => {
                                *guard = None;
                                return Err(TaigaError::unauthenticated(format!(
                                    "token expired and refresh failed: {}",
                                    e
                                )));
                            }
                        }
                    }

                    if !current.is_expired() {
                        return Ok(current.access_token);
                    }

                    // Expired without a refresh token: fall through to login
                    *guard = None;
                }
            }
        }

        let session = self.establish().await?;
        let token = session.access_token.clone();
        *guard = Some(session);
        Ok(token)
    }

    /// Log in with explicit credentials, replacing any current session
    pub async fn login(&self, username: &str, password: &str) -> TaigaResult<AuthSession> {
        let session = self
            .password_login(username, password)
            .await?;
        let mut guard = self.session.lock().await;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Force a refresh of the current session
    pub async fn refresh_now(&self) -> TaigaResult<AuthSession> {
        let mut guard = self.session.lock().await;
        let refresh_token = guard
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
            .ok_or_else(|| TaigaError::unauthenticated("no refresh token available"))?;

        let renewed = self.refresh(&refresh_token).await?;
        *guard = Some(renewed.clone());
        Ok(renewed)
    }

    /// Drop the current session. In-flight requests keep their token.
    pub async fn logout(&self) {
        let mut guard = self.session.lock().await;
        *guard = None;
    }

    /// Clear the cached token after an upstream 401
    pub async fn invalidate(&self) {
        let mut guard = self.session.lock().await;
        if guard.take().is_some() {
            warn!("Cached token rejected upstream, cleared");
        }
    }

    /// Authentication status for the management tool
    pub async fn status(&self) -> AuthStatus {
        let guard = self.session.lock().await;
        match guard.as_ref() {
            Some(session) if !session.is_expired() => AuthStatus {
                authenticated: true,
                expires_at: session.expires_at,
            },
            _ => AuthStatus {
                authenticated: false,
                expires_at: None,
            },
        }
    }

    /// Seed a session directly (tests and static-token startup)
    pub async fn install_session(&self, session: AuthSession) {
        let mut guard = self.session.lock().await;
        *guard = Some(session);
    }

    async fn establish(&self) -> TaigaResult<AuthSession> {
        match &self.credentials {
            Credentials::StaticToken(token) => Ok(AuthSession::from_static_token(token.clone())),
            Credentials::Password { username, password } => {
                self.password_login(username, password).await
            }
            Credentials::None => Err(TaigaError::unauthenticated(
                "no credentials configured; call taiga_login first",
            )),
        }
    }

    async fn password_login(&self, username: &str, password: &str) -> TaigaResult<AuthSession> {
        let mut request = ApiRequest::new(HttpMethod::Post, "/auth");
        request.body = Some(json!({
            "type": "normal",
            "username": username,
            "password": password,
        }));

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(TaigaError::from_status(
                response.status,
                &response.body,
                "auth",
                response.retry_after,
            ));
        }

        let tokens: AuthTokens = serde_json::from_value(response.body)?;
        Ok(AuthSession::from_tokens(tokens, DEFAULT_TOKEN_LIFETIME))
    }

    async fn refresh(&self, refresh_token: &str) -> TaigaResult<AuthSession> {
        let mut request = ApiRequest::new(HttpMethod::Post, "/auth/refresh");
        request.body = Some(json!({ "refresh": refresh_token }));

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(TaigaError::from_status(
                response.status,
                &response.body,
                "auth/refresh",
                response.retry_after,
            ));
        }

        let tokens: AuthTokens = serde_json::from_value(response.body)?;
        Ok(AuthSession::from_tokens(tokens, DEFAULT_TOKEN_LIFETIME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ApiResponse, MockTransport};

    fn near_expiry_session() -> AuthSession {
        AuthSession {
            access_token: "old-token".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Some(Utc::now() + ChronoDuration::seconds(30)),
            issued_at: Utc::now(),
        }
    }

    fn manager(mock: Arc<MockTransport>) -> AuthManager {
        AuthManager::new(mock, Credentials::None, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_fresh_token_is_served_without_refresh() {
        let mock = Arc::new(MockTransport::new());
        let auth = manager(mock.clone());

        auth.install_session(AuthSession {
            access_token: "fresh".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Some(Utc::now() + ChronoDuration::hours(2)),
            issued_at: Utc::now(),
        })
        .await;

        assert_eq!(auth.get_valid_token().await.unwrap(), "fresh");
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_near_expiry_triggers_refresh() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(
            HttpMethod::Post,
            "/auth/refresh",
            json!({"auth_token": "new-token", "refresh": "refresh-2"}),
        );

        let auth = manager(mock.clone());
        auth.install_session(near_expiry_session()).await;

        assert_eq!(auth.get_valid_token().await.unwrap(), "new-token");
        assert_eq!(mock.request_count(HttpMethod::Post, "/auth/refresh"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_coalesce_on_one_refresh() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(
            HttpMethod::Post,
            "/auth/refresh",
            json!({"auth_token": "new-token", "refresh": "refresh-2"}),
        );

        let auth = Arc::new(manager(mock.clone()));
        auth.install_session(near_expiry_session()).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let auth = auth.clone();
            handles.push(tokio::spawn(async move { auth.get_valid_token().await }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "new-token");
        }

        // Exactly one refresh across all ten callers
        assert_eq!(mock.request_count(HttpMethod::Post, "/auth/refresh"), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_token_within_validity() {
        let mock = Arc::new(MockTransport::new());
        mock.enqueue(Ok(ApiResponse::status(503)));

        let auth = manager(mock.clone());
        auth.install_session(near_expiry_session()).await;

        // Refresh fails but the token is still valid for 30s
        assert_eq!(auth.get_valid_token().await.unwrap(), "old-token");
    }

    #[tokio::test]
    async fn test_expired_token_with_failed_refresh_is_unauthenticated() {
        let mock = Arc::new(MockTransport::new());
        mock.enqueue(Ok(ApiResponse::status(503)));

        let auth = manager(mock.clone());
        auth.install_session(AuthSession {
            access_token: "dead".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Some(Utc::now() - ChronoDuration::seconds(5)),
            issued_at: Utc::now() - ChronoDuration::hours(9),
        })
        .await;

        let result = auth.get_valid_token().await;
        assert!(matches!(result, Err(TaigaError::Unauthenticated { .. })));

        // Session was cleared
        assert!(!auth.status().await.authenticated);
    }

    #[tokio::test]
    async fn test_static_token_never_refreshes() {
        let mock = Arc::new(MockTransport::new());
        let auth = AuthManager::new(
            mock.clone(),
            Credentials::StaticToken("static-token".to_string()),
            Duration::from_secs(300),
        );

        assert_eq!(auth.get_valid_token().await.unwrap(), "static-token");
        assert_eq!(auth.get_valid_token().await.unwrap(), "static-token");
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_password_login_and_logout() {
        let mock = Arc::new(MockTransport::new());
        mock.add_mock(
            HttpMethod::Post,
            "/auth",
            json!({"auth_token": "login-token", "refresh": "refresh-1"}),
        );

        let auth = AuthManager::new(
            mock.clone(),
            Credentials::Password {
                username: "admin".to_string(),
                password: "secret".to_string(),
            },
            Duration::from_secs(300),
        );

        assert_eq!(auth.get_valid_token().await.unwrap(), "login-token");
        assert!(auth.status().await.authenticated);

        auth.logout().await;
        assert!(!auth.status().await.authenticated);
    }

    #[tokio::test]
    async fn test_no_credentials_is_unauthenticated() {
        let mock = Arc::new(MockTransport::new());
        let auth = manager(mock);

        let result = auth.get_valid_token().await;
        assert!(matches!(result, Err(TaigaError::Unauthenticated { .. })));
    }
}
