//! DTZ practice proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                      DTZ PROXY                        │
//!                        │                                                       │
//!   Client Request       │  ┌──────────┐   ┌────────────┐   ┌───────────────┐   │
//!   ─────────────────────┼─▶│ request  │──▶│ validation │──▶│ rate limiter  │   │
//!                        │  │ id/trace │   │ (400)      │   │ (429)         │   │
//!                        │  └──────────┘   └────────────┘   └───────┬───────┘   │
//!                        │                                          │           │
//!                        │                                  ┌───────▼───────┐   │     ┌──────────┐
//!                        │                                  │ counter store │◀──┼────▶│ Upstash  │
//!                        │                                  └───────────────┘   │     └──────────┘
//!                        │                                          │           │
//!   Client Response      │  ┌──────────┐   ┌────────────┐   ┌───────▼───────┐   │     ┌──────────┐
//!   ◀────────────────────┼──│ response │◀──│  shaping   │◀──│ upstream call │◀──┼────▶│  OpenAI  │
//!                        │  │ ApiError │   │            │   │ guard (504)   │   │     └──────────┘
//!                        │  └──────────┘   └────────────┘   └───────────────┘   │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dtz_proxy::config::load_config;
use dtz_proxy::lifecycle::{wait_for_signal, Shutdown};
use dtz_proxy::observability::{init_logging, metrics};
use dtz_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "dtz-proxy")]
#[command(about = "Rate-limited OpenAI proxy for DTZ B1 practice", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // .env is optional; the environment wins over it.
    let _ = dotenvy::dotenv();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);

    tracing::info!("dtz-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        upstream_timeout_ms = config.upstream.timeout_ms,
        has_openai_key = config.upstream.api_key.is_some(),
        has_upstash = config.rate_limit.has_upstash(),
        rate_window_secs = config.rate_limit.window_secs,
        "Configuration loaded"
    );

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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
