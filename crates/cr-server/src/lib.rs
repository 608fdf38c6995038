//! cr-server: HTTP API for classreel.
//!
//! Serves the video catalog, range-streams video bytes, reconciles playback
//! events into watch records and view counters, and exposes admin grade
//! and statistics endpoints.

pub mod access;
pub mod context;
pub mod error;
pub mod grade_cache;
pub mod middleware;
pub mod reconciler;
pub mod router;
pub mod routes;
pub mod storage;

use std::net::SocketAddr;
use std::path::Path;

use cr_core::config::Config;

use crate::context::AppContext;

fn ensure_dir(dir: &Path, what: &str) -> cr_core::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        tracing::info!("Created {what} directory {}", dir.display());
    }
    Ok(())
}

/// Start the classreel server and run until a shutdown signal arrives.
pub async fn start(config: Config) -> cr_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    ensure_dir(&config.server.data_dir, "data")?;
    ensure_dir(&config.server.upload_dir, "upload")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| cr_core::Error::Internal(format!("Invalid server address: {e}")))?;
    let static_dir = config.server.static_dir.clone();

    tracing::info!(
        data_dir = %config.server.data_dir.display(),
        upload_dir = %config.server.upload_dir.display(),
        storage = config.storage.driver.as_str(),
        "Opening stores"
    );
    let ctx = AppContext::from_config(config);
    let app = router::build_router(ctx, static_dir);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| cr_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
