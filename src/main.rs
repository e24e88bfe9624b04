//! Edge reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                     EDGE PROXY                       │
//!                        │                                                      │
//!     Client Request     │  ┌─────────┐    ┌──────────┐                         │
//!     ───────────────────┼─▶│  http   │───▶│ routing  │                         │
//!                        │  │ server  │    │ dispatch │                         │
//!                        │  └─────────┘    └────┬─────┘                         │
//!                        │          ┌───────────┼──────────────┐                │
//!                        │          ▼           ▼              ▼                │
//!                        │   ┌───────────┐ ┌──────────┐  ┌──────────────┐       │
//!                        │   │ preflight │ │ proxy::  │  │ proxy::      │       │
//!                        │   │ / invalid │ │ api      │  │ download     │       │
//!                        │   └───────────┘ │ (buffer, │  │ (ssrf guard, │       │
//!                        │                 │  base64) │  │  stream)     │       │
//!     Client Response    │                 └────┬─────┘  └──────┬───────┘       │
//!     ◀──────────────────┼─────────────────────┴───────────────┴───────────────┼──── Upstream
//!                        │                                                      │
//!                        │  Cross-cutting: config · security · observability · │
//!                        │                 lifecycle                            │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_proxy::config::{load_config, ProxyConfig};
use edge_proxy::lifecycle::{signals, Shutdown};
use edge_proxy::observability::{logging, metrics};
use edge_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "edge-proxy")]
#[command(about = "Edge reverse proxy with base64 envelopes and guarded downloads", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability);

    tracing::info!("edge-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = ?config.routes.iter().map(|r| r.prefix.as_str()).collect::<Vec<_>>(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { signals::forward_to(&shutdown).await }
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
