//! estimate-gateway server entry point.
//!
//! Starts the Axum HTTP server with the room WebSocket and the read-only
//! REST endpoints.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use estimate_gateway::app_state::AppState;
use estimate_gateway::config::{GatewayConfig, LogFormat};
use estimate_gateway::server::{build_coordinator, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, backend = ?config.store_backend, "starting estimate-gateway");

    // Build service layer
    let coordinator = build_coordinator(&config)
        .await
        .context("failed to open room store")?;
    let app = build_router(AppState::new(coordinator), config.http_timeout());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
