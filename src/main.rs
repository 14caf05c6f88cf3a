//! Cosmos Scale
//!
//! HTTP service that increments a Cosmos DB collection's provisioned
//! throughput (RU) through the control-plane REST API.

use anyhow::Result;
use clap::Parser;
use cosmos_scale::{
    config::{Environment, Settings},
    server::App,
};
use std::path::PathBuf;

/// Cosmos Scale
///
/// Reads a collection's current throughput offer, adds the configured RU
/// increment, and persists the new value back to Cosmos DB.
#[derive(Parser, Debug)]
#[command(name = "cosmos-scale")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides PORT env var)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides HOST env var)
    #[arg(long)]
    host: Option<String>,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long)]
    log_level: Option<String>,

    /// Environment: dev, staging, prod (overrides ENVIRONMENT env var)
    #[arg(short, long)]
    env: Option<Environment>,

    /// Path to a local.settings.json file (Azure Functions "Values" format)
    #[arg(long)]
    settings_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration first (before logging, so we can use log_level)
    let mut settings = Settings::load(args.settings_file.as_deref())?;

    // Override settings with CLI arguments
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if let Some(env) = args.env {
        settings.environment = env;
    }

    // Initialize tracing subscriber with JSON output
    init_tracing(&settings.log_level);

    tracing::info!(
        app_name = %settings.app_name,
        version = %settings.app_version,
        environment = %settings.environment,
        host = %settings.host,
        port = %settings.port,
        database_id = %settings.cosmos.database_id,
        container_id = %settings.cosmos.container_id,
        "Starting application"
    );

    // Build the application
    let app = App::new(settings)?;

    // Run the server with graceful shutdown
    app.run_with_graceful_shutdown().await?;

    tracing::info!("Application shutdown complete");

    Ok(())
}

/// Initialize tracing subscriber with the specified log level
fn init_tracing(log_level: &str) {
    // Build filter from RUST_LOG env var or use provided log level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .init();
}
