//! Streamer control server
//!
//! Accepts streaming job configurations over HTTP, validates them with
//! streamer-config and hands accepted jobs to the transcode pipeline.

mod config;
mod config_file;
mod error;
mod http;
mod metrics;
mod pipeline;
mod state;

#[cfg(test)]
mod integration;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, ServerConfig};
use crate::error::{Result, ServerError};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "streamer-control";

/// Used when RUST_LOG is not set; the configured level covers everything else
const DEFAULT_LOG_FILTER: &str = "streamer_control=debug,tower_http=debug";

#[derive(Parser, Debug)]
#[command(name = "streamer-control")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(default_value = "config.toml")]
    config: PathBuf,

    /// Listen address, overrides the configuration file
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Write a default configuration file to the config path and exit
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.generate_config {
        config_file::generate_default_config(&args.config)?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    // Logging depends on the config file, so problems loading it are
    // reported once the subscriber is up.
    let (mut config, load_error) = match config_file::load(&args.config) {
        Ok(config) => (config, None),
        Err(e) => (ServerConfig::default(), Some(e)),
    };
    if let Some(bind) = args.bind {
        config.host = bind.ip().to_string();
        config.port = bind.port();
    }

    init_logging(&config);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = load_error {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            args.config.display(),
            e
        );
    }
    tracing::info!("Configuration loaded: {:?}", config);

    // Create application state
    let state = Arc::new(AppState::new(config.clone()));

    // Build router
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = config.socket_addr();
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Don't leave an orphaned pipeline behind.
    let pipeline = Arc::clone(&state.pipeline);
    let stopped = tokio::task::spawn_blocking(move || pipeline.stop())
        .await
        .map_err(|e| ServerError::Internal(format!("Task failed: {}", e)))??;
    if stopped {
        tracing::info!("Stopped running job on shutdown");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Initialize logging with tracing
fn init_logging(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},{}", config.log_level, DEFAULT_LOG_FILTER).into());

    let (pretty, json) = match config.log_format {
        LogFormat::Pretty => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}
