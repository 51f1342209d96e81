//! Authenticating reverse proxy for a protected FHIR API.
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                FHIR AUTH PROXY                 │
//!                    │                                               │
//!   Client Request   │  ┌─────────┐   ┌──────────────┐   ┌────────┐ │
//!   ─────────────────┼─▶│  http   │──▶│  credential  │──▶│forward │─┼──▶ Upstream
//!                    │  │ server  │   │    store     │   │ + retry│ │    FHIR API
//!                    │  └─────────┘   └──────┬───────┘   └────────┘ │
//!                    │                       │ refresh               │
//!                    │                       ▼                       │
//!                    │                ┌──────────────┐               │
//!                    │                │authenticator │───────────────┼──▶ Identity
//!                    │                │cookie | token│               │    Provider
//!                    │                └──────────────┘               │
//!                    │                                               │
//!                    │  startup: mediator registration, metrics      │
//!                    └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fhir_auth_proxy::config::{load_config, ProxyConfig};
use fhir_auth_proxy::http::HttpServer;
use fhir_auth_proxy::mediator;
use fhir_auth_proxy::observability::metrics;

#[derive(Debug, Parser)]
#[command(name = "fhir-auth-proxy", about = "Authenticating reverse proxy")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    // Initialize tracing subscriber
    let default_filter = format!("fhir_auth_proxy={}", config.observability.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "fhir-auth-proxy starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        base_path = %config.upstream.base_path,
        "Configuration loaded"
    );

    // Registration failure is fatal: the platform must know about this
    // mediator before it takes traffic.
    if config.mediator.enabled {
        let descriptor = mediator::Descriptor::from_config(&config);
        if let Err(e) = mediator::register(&config.mediator, &descriptor).await {
            tracing::error!(error = %e, "Mediator registration failed");
            std::process::exit(1);
        }
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
