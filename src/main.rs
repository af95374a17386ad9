//! Login service (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────────┐
//!                     │                    LOGIN SERVICE                      │
//!                     │                                                       │
//!   POST /login       │  ┌─────────┐    ┌────────────┐    ┌───────────────┐   │
//!   ──────────────────┼─▶│  http   │───▶│    auth    │───▶│ users::lookup │   │
//!                     │  │ server  │    │credentials │    │               │   │
//!                     │  └─────────┘    └────────────┘    └───────┬───────┘   │
//!                     │                                           │           │
//!                     │                                           ▼           │
//!                     │                 ┌─────────────────────────────────┐   │
//!                     │                 │           resilience            │   │
//!                     │                 │ circuit_breaker ──▶ timeouts    │───┼──▶ User API
//!                     │                 └─────────────┬───────────────────┘   │
//!                     │                               │ open                  │
//!                     │                               ▼                       │
//!                     │                       users::fallback                 │
//!                     │                                                       │
//!                     │  config · observability · lifecycle · admin           │
//!                     └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use clap::Parser;
use tokio::net::TcpListener;

use resilient_auth::config::{load_config, ServiceConfig};
use resilient_auth::http::HttpServer;
use resilient_auth::lifecycle::{signals::spawn_signal_listener, Shutdown};
use resilient_auth::observability::{logging::init_logging, metrics::init_metrics};

#[derive(Parser)]
#[command(name = "resilient-auth")]
#[command(about = "Login service with a circuit-breaker-guarded user lookup", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, env = "RESILIENT_AUTH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!("resilient-auth v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config = ?args.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
