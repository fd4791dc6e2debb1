//! HTTP server initialization and runtime setup.
//!
//! Builds the Gemini client, wires application state and runs the Axum server
//! until a shutdown signal arrives.

use crate::application::services::ProxyService;
use crate::config::Config;
use crate::infrastructure::gemini::TlsGeminiClient;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - TLS Gemini client with an empty TOFU store
/// - Proxy service and application state
/// - Axum HTTP server with graceful shutdown on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - The TLS configuration cannot be built
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let client = TlsGeminiClient::new(config.client_settings())
        .context("Failed to initialize Gemini client")?;
    tracing::info!("Gemini client ready (TOFU certificate pinning)");

    let proxy_service = Arc::new(ProxyService::new(Arc::new(client)));
    let state = AppState::new(proxy_service);

    let app = app_router(state, config.behind_proxy, &config.static_dir);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
