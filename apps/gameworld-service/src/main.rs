//! # GameWorld Service
//!
//! Loads configuration, connects to PostgreSQL, applies migrations and runs
//! the celestial object service until SIGINT/SIGTERM. SIGHUP reloads the
//! configuration in place.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gameworld_db::Database;
use gameworld_service::{telemetry, ConfigWatcher, GameWorldService};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "gameworld-service", about = "Celestial object catalogue service")]
struct Args {
    /// Configuration file (TOML or JSON). Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let watcher = Arc::new(
        ConfigWatcher::load(args.config.clone()).context("Failed to load configuration")?,
    );
    let config = watcher.current();
    telemetry::init(&config.logging)?;

    info!("Starting GameWorld service...");
    info!(database = ?config.database, service = ?config.service, "Configuration loaded");

    let db = Database::connect(&config.database.to_db_config())
        .await
        .context("Failed to connect to PostgreSQL")?;
    info!("Connected to PostgreSQL");

    db.run_migrations().await.context("Failed to run migrations")?;
    info!("Database migrations complete");

    let service = GameWorldService::new(Arc::new(db.objects()), watcher.subscribe());
    match service.health_check().await {
        Ok(_) => info!("GameWorld service ready"),
        Err(status) => error!(reason = status.message(), "Initial health check failed"),
    }

    #[cfg(unix)]
    tokio::spawn(reload_on_hangup(watcher.clone()));

    shutdown_signal().await;

    db.close();
    info!("Service shutdown complete");
    Ok(())
}

/// Reloads configuration whenever the process receives SIGHUP.
#[cfg(unix)]
async fn reload_on_hangup(watcher: Arc<ConfigWatcher>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, "Failed to install SIGHUP handler, live reload disabled");
            return;
        }
    };
    while hangup.recv().await.is_some() {
        match watcher.reload() {
            Ok(true) => info!("Configuration reloaded"),
            Ok(false) => info!("Configuration unchanged"),
            Err(e) => error!(error = %e, "Configuration reload failed"),
        }
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
