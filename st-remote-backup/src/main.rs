//! st-remote-backup - Main entry point
//!
//! Serves the backup API and the static control panel.

use anyhow::Result;
use clap::Parser;
use st_remote_backup::{api, config::Config, logs::LogBuffer, utils};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Initialize logging
    let logs = Arc::new(LogBuffer::new(
        config.log.max_lines,
        config.log.utc_offset_minutes,
    ));
    let log_level = args.log_level.as_deref().unwrap_or(config.log.level.as_str());
    utils::logger::init(log_level, logs.clone())?;

    let state = api::AppState::new(config, logs);
    if state.credentials.load().await {
        tracing::info!(
            "Loaded credentials from {}",
            state.credentials.path().display()
        );
    }
    if state.credentials.is_open().await {
        tracing::warn!("[auth] no credentials configured, API is unauthenticated");
    }

    let app = api::create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "[st-remote-backup] listening on {}, DATA_DIR={}, BACKUP_DIR={}",
        state.config.server.port,
        state.config.storage.data_dir.display(),
        state.config.storage.backup_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
