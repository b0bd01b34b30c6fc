//! Graceful shutdown coordination

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use log::{info, warn};

/// Shutdown signal types with escalating urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// Graceful shutdown - allow in-flight work to complete
    Graceful,
    /// Forced shutdown - terminate immediately
    Forced,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Graceful => write!(f, "graceful"),
            ShutdownSignal::Forced => write!(f, "forced"),
        }
    }
}

/// Graceful shutdown coordinator
pub struct ShutdownCoordinator {
    sender: broadcast::Sender<ShutdownSignal>,
    is_shutting_down: Arc<RwLock<bool>>,
    active_tasks: Arc<RwLock<u32>>,
    graceful_timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator with the default grace period
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    /// Create a new shutdown coordinator with a custom grace period
    pub fn with_timeout(graceful_timeout: Duration) -> Self {
        let (sender, _) = broadcast::channel(16);

        Self {
            sender,
            is_shutting_down: Arc::new(RwLock::new(false)),
            active_tasks: Arc::new(RwLock::new(0)),
            graceful_timeout,
        }
    }

    /// Subscribe to shutdown signals
    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownSignal> {
        self.sender.subscribe()
    }

    /// Check if shutdown is in progress
    pub async fn is_shutting_down(&self) -> bool {
        *self.is_shutting_down.read().await
    }

    /// Increment active task counter
    pub async fn task_started(&self) {
        let mut count = self.active_tasks.write().await;
        *count += 1;
    }

    /// Decrement active task counter
    pub async fn task_completed(&self) {
        let mut count = self.active_tasks.write().await;
        if *count > 0 {
            *count -= 1;
        }
    }

    /// Get current active task count
    pub async fn active_task_count(&self) -> u32 {
        *self.active_tasks.read().await
    }

    /// Initiate shutdown: graceful first, forced once the grace period lapses
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        {
            let mut shutting_down = self.is_shutting_down.write().await;
            if *shutting_down {
                return Err(ShutdownError::AlreadyShuttingDown);
            }
            *shutting_down = true;
        }

        info!("Starting graceful shutdown");

        // Receivers may have all gone away already; that is a clean shutdown
        let _ = self.sender.send(ShutdownSignal::Graceful);

        if self.wait_for_tasks(self.graceful_timeout).await {
            info!("Graceful shutdown completed successfully");
            return Ok(());
        }

        warn!("Graceful shutdown timeout, forcing shutdown");
        let _ = self.sender.send(ShutdownSignal::Forced);

        // Give forced shutdown a brief moment to take effect
        tokio::time::sleep(Duration::from_millis(250)).await;

        let remaining_tasks = self.active_task_count().await;
        if remaining_tasks > 0 {
            warn!("Forced shutdown completed with {} tasks still active", remaining_tasks);
            Err(ShutdownError::TasksRemaining(remaining_tasks))
        } else {
            info!("Forced shutdown completed successfully");
            Ok(())
        }
    }

    /// Wait for all tasks to complete within the given timeout
    async fn wait_for_tasks(&self, timeout_duration: Duration) -> bool {
        let start = tokio::time::Instant::now();

        while start.elapsed() < timeout_duration {
            if self.active_task_count().await == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        false
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shutdown error types
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    /// Shutdown already in progress
    #[error("Shutdown already in progress")]
    AlreadyShuttingDown,

    /// Tasks remaining after forced shutdown
    #[error("Forced shutdown completed with {0} tasks still active")]
    TasksRemaining(u32),
}
