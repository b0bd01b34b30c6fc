//! HTTP session pool

use reqwest::Client;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use taiga_config::HttpConfig;

use crate::errors::{TaigaError, TaigaResult};

/// Counters exposed by the session pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCounters {
    /// Requests currently in flight
    pub in_flight: u64,
    /// Requests started since startup
    pub started_total: u64,
    /// Requests finished since startup
    pub finished_total: u64,
}

/// Process-wide pool of keep-alive connections to the upstream host.
///
/// Wraps one shared `reqwest::Client` configured with per-host connection
/// limits and idle eviction. Created at startup, closed once at shutdown;
/// acquisition after close fails immediately.
pub struct HttpSession {
    client: Client,
    closed: AtomicBool,
    in_flight: AtomicU64,
    started_total: AtomicU64,
    finished_total: AtomicU64,
    shutdown_grace: Duration,
}

impl HttpSession {
    /// Build the session pool from configuration
    pub fn new(config: &HttpConfig, request_timeout: Duration) -> TaigaResult<Self> {
        debug!(
            "Creating HTTP session with timeout {}s, {} idle connections per host",
            request_timeout.as_secs(),
            config.connection_pool.max_idle_per_host
        );

        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(config.connection_pool.connection_timeout)
            .pool_max_idle_per_host(config.connection_pool.max_idle_per_host)
            .pool_idle_timeout(config.connection_pool.idle_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| TaigaError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            closed: AtomicBool::new(false),
            in_flight: AtomicU64::new(0),
            started_total: AtomicU64::new(0),
            finished_total: AtomicU64::new(0),
            shutdown_grace: config.connection_pool.shutdown_grace,
        })
    }

    /// Acquire the pool for one request. Fails once the pool is shut down.
    pub fn acquire(self: &Arc<Self>) -> TaigaResult<SessionGuard> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TaigaError::internal("HTTP session pool is shut down"));
        }

        self.in_flight.fetch_add(1, Ordering::Relaxed);
        self.started_total.fetch_add(1, Ordering::Relaxed);

        Ok(SessionGuard {
            session: Arc::clone(self),
        })
    }

    /// The underlying pooled client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Current counters
    pub fn counters(&self) -> SessionCounters {
        SessionCounters {
            in_flight: self.in_flight.load(Ordering::Relaxed),
            started_total: self.started_total.load(Ordering::Relaxed),
            finished_total: self.finished_total.load(Ordering::Relaxed),
        }
    }

    /// Close the pool: refuse new acquisitions, wait for in-flight requests
    /// up to the grace period, then drop remaining connections.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            warn!("HTTP session pool shut down twice");
            return;
        }

        let start = tokio::time::Instant::now();
        while self.in_flight.load(Ordering::Relaxed) > 0 {
            if start.elapsed() >= self.shutdown_grace {
                warn!(
                    "Forcing HTTP session close with {} requests in flight",
                    self.in_flight.load(Ordering::Relaxed)
                );
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        info!("HTTP session pool drained and closed");
    }
}

/// RAII guard accounting for one in-flight request
pub struct SessionGuard {
    session: Arc<HttpSession>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.in_flight.fetch_sub(1, Ordering::Relaxed);
        self.session.finished_total.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Arc<HttpSession> {
        Arc::new(HttpSession::new(&HttpConfig::default(), Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_counters_track_guards() {
        let session = session();

        let g1 = session.acquire().unwrap();
        let g2 = session.acquire().unwrap();
        assert_eq!(session.counters().in_flight, 2);
        assert_eq!(session.counters().started_total, 2);

        drop(g1);
        assert_eq!(session.counters().in_flight, 1);
        assert_eq!(session.counters().finished_total, 1);

        drop(g2);
        assert_eq!(session.counters().in_flight, 0);
    }

    #[tokio::test]
    async fn test_acquire_after_shutdown_fails() {
        let session = session();
        session.shutdown().await;

        let result = session.acquire();
        assert!(matches!(result, Err(TaigaError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight() {
        let session = session();
        let guard = session.acquire().unwrap();

        let session_clone = session.clone();
        let handle = tokio::spawn(async move {
            session_clone.shutdown().await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        drop(guard);
        handle.await.unwrap();
        assert!(session.acquire().is_err());
    }
}
