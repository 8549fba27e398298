//! Request telemetry demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request          ┌──────────────────────────────────────────────┐
//!     ────────────────────────┼─▶ TraceLayer ─▶ TelemetryLayer ─▶ handlers   │
//!                             │                    │                         │
//!     Client Response         │                    │ one event per request   │
//!     ◀───────────────────────┼────────────────────┤                         │
//!                             │                    ▼                         │
//!                             │            TelemetryClient                   │
//!                             │                    │ enqueue (non-blocking)  │
//!                             │                    ▼                         │
//!                             │          BatchTransmission worker ───────────┼──▶ ingestion API
//!                             └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use request_telemetry::config::load_config;
use request_telemetry::http::{HttpServer, TelemetryLayer};
use request_telemetry::lifecycle::shutdown_signal;
use request_telemetry::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "request-telemetry")]
#[command(about = "HTTP server that reports per-request telemetry events", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults plus TELEMETRY_* variables otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!("request-telemetry v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Bind first so a failed bind never leaves a started client behind.
    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let local_addr = listener.local_addr()?;

    let telemetry = TelemetryLayer::start(&config.telemetry)?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let server = HttpServer::new(&config.server, telemetry.clone());
    let served = server.run(listener, shutdown_signal()).await;

    telemetry.stop().await;
    served?;

    tracing::info!("Shutdown complete");
    Ok(())
}
