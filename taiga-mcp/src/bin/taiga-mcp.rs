//! Process entry point
//!
//! Exit codes: 0 on clean shutdown, 1 on configuration errors, 2 on
//! unrecoverable runtime errors (duplicate registration, bind failure).

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use taiga_config::{ConfigLoader, TaigaConfig};
use taiga_mcp::{McpError, McpService};

fn init_tracing(config: &TaigaConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    // stdout is the protocol channel on stdio transport; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Graceful shutdown signal: ctrl-c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn run() -> Result<(), (u8, anyhow::Error)> {
    let config = ConfigLoader::new()
        .from_env()
        .map_err(|e| (1u8, anyhow::anyhow!("configuration error: {}", e)))?;

    init_tracing(&config);

    let transport = config.mcp.transport;
    let service = Arc::new(
        McpService::from_config(config).map_err(|e| match e {
            McpError::Configuration { .. } => (1u8, anyhow::anyhow!(e)),
            other => (2u8, anyhow::anyhow!(other)),
        })?,
    );

    tracing::info!(transport = ?transport, "Starting taiga-mcp");

    let serve_service = service.clone();
    let mut serve_task = tokio::spawn(async move { serve_service.start().await });

    tokio::select! {
        result = &mut serve_task => {
            match result {
                // Transport ended on its own (EOF on stdin): clean exit
                Ok(Ok(())) => {
                    if let Err(e) = service.shutdown().await {
                        tracing::debug!("Shutdown after transport end: {}", e);
                    }
                    Ok(())
                }
                Ok(Err(e)) => Err((2u8, anyhow::anyhow!(e))),
                Err(e) => Err((2u8, anyhow::anyhow!("transport task failed: {}", e))),
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            if let Err(e) = service.shutdown().await {
                tracing::warn!("Shutdown error: {}", e);
            }
            serve_task.abort();
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err((code, error)) => {
            eprintln!("taiga-mcp: {}", error);
            ExitCode::from(code)
        }
    }
}
