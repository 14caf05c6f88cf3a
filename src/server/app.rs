//! Application server
//!
//! This module provides the main application server implementation
//! including initialization and graceful shutdown handling.

use crate::{
    config::Settings,
    server::{routes, state::AppState},
};
use anyhow::Result;
use std::net::SocketAddr;
use tokio::signal;

/// Main application struct
pub struct App {
    settings: Settings,
    state: AppState,
}

impl App {
    /// Create a new application instance
    pub fn new(settings: Settings) -> Result<Self> {
        tracing::debug!("Initializing application state");
        let state = AppState::new(settings.clone());

        Ok(Self { settings, state })
    }

    /// Run the server with graceful shutdown support
    ///
    /// The server will shut down gracefully when receiving SIGINT (Ctrl+C)
    /// or SIGTERM signals.
    pub async fn run_with_graceful_shutdown(self) -> Result<()> {
        let addr = self.settings.server_addr().parse::<SocketAddr>()?;
        let router = routes::create_router(self.state.clone());

        tracing::info!("Starting server on {} with graceful shutdown enabled", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// Create a future that completes when a shutdown signal is received
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
