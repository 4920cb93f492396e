//! Pipeline server.
//!
//! Boots the request pipeline from a TOML file and serves it over HTTP.
//!
//! ```text
//!     Client Request
//!     ─────────▶ axum (trace, timeout, request id)
//!                  │
//!                  ▼
//!          ┌──────────────────────────── Pipeline ───────────────────────────┐
//!          │ error boundary ──▶ routing stage ──▶ action dispatch ──▶ action │
//!          └─────────────────────────────────────────────────────────────────┘
//!                  │
//!     ◀─────────  Response (or 500 from the boundary)
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use action_pipeline::config::{load_config, AppConfig, ConfigWatcher};
use action_pipeline::lifecycle::Shutdown;
use action_pipeline::observability::{logging, metrics};
use action_pipeline::HttpServer;

#[derive(Parser)]
#[command(name = "pipeline-server")]
#[command(about = "Serve actions through the request pipeline", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,

    /// Reload the pipeline when the configuration file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    if cli.check {
        println!(
            "configuration OK: {} actions, {} routes",
            config.actions.len(),
            config.routes.len()
        );
        return Ok(());
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("pipeline-server v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        actions = config.actions.len(),
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher handle alive for the lifetime of the server.
    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;
    let shutdown = Shutdown::new();

    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
