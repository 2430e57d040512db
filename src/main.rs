//! Cockpit - Capture Station Health Service
//!
//! Keeps a registry of remote capture stations, checks whether they are
//! reachable and collects diagnostic reports from them over SSH.

mod config;
mod db;
mod monitor;
mod probe;
mod web;

use config::ServerConfig;
use db::Store;
use monitor::Monitor;
use probe::SshProbe;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("cockpit=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting Cockpit on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);

    // Initialize database
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    let probe = Arc::new(SshProbe::new(cfg.ssh.clone()));
    tracing::info!(
        "Probing stations with {} (status deadline {:?}, diagnostics deadline {:?})",
        cfg.ssh.binary,
        cfg.timeouts.status,
        cfg.timeouts.diagnostics
    );

    let monitor = Arc::new(Monitor::new(store.clone(), store, probe, cfg.timeouts));

    // Start web server
    let server = Server::new(cfg, monitor);
    server.start().await?;

    Ok(())
}
