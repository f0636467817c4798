//! Server startup and graceful shutdown

use crate::routes::AppState;
use anyhow::Result;
use std::net::SocketAddr;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// Bind the listener and serve until a termination signal or the idle
/// watchdog requests shutdown.
///
/// On either trigger the server stops accepting connections, completes
/// in-flight responses, releases the socket and returns.
pub async fn run_server(
    addr: SocketAddr,
    state: AppState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<()> {
    let app = crate::routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("moderation service listening on http://{addr}");
    info!("health check: http://{addr}/health");

    let shutdown = async move {
        tokio::select! {
            _ = shutdown_signal() => warn!("termination signal received, stopping server"),
            _ = shutdown_rx.changed() => warn!("idle timeout reached, stopping server"),
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
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
