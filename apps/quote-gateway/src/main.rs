//! Quote Gateway Binary
//!
//! Starts the quote gateway HTTP/SSE server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin quote-gateway
//! ```
//!
//! # Environment Variables
//!
//! All optional:
//! - `QUOTE_GATEWAY_PORT`: HTTP server port (default: 8025)
//! - `QUOTE_GATEWAY_UPSTREAM_URL`: Yahoo Finance base URL
//! - `QUOTE_GATEWAY_UPSTREAM_TIMEOUT_SECS`: Per-request deadline (default: 30)
//! - `QUOTE_GATEWAY_REQUEST_SPACING_MS`: Minimum upstream request spacing (default: 5000)
//! - `QUOTE_GATEWAY_CHART_RETRY_ATTEMPTS`: Chart fetch attempts (default: 3)
//! - `QUOTE_GATEWAY_CHART_RETRY_BASE_MS`: Linear retry backoff base (default: 3000)
//! - `QUOTE_GATEWAY_CACHE_TTL_SECS`: Chart cache TTL (default: 300)
//! - `QUOTE_GATEWAY_CACHE_CAPACITY`: Chart cache capacity, 0 = unbounded (default: 0)
//! - `QUOTE_GATEWAY_OPEN_INTERVAL_SECS`: Stream cadence while market open (default: 10)
//! - `QUOTE_GATEWAY_CLOSED_INTERVAL_SECS`: Stream cadence while market closed (default: 60)
//! - `QUOTE_GATEWAY_HEARTBEAT_SECS`: Stream keep-alive period (default: 30)
//! - `RUST_LOG`: Log level (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;

use quote_gateway::application::services::ChartService;
use quote_gateway::infrastructure::cache::{ChartCache, SystemClock};
use quote_gateway::infrastructure::config::GatewayConfig;
use quote_gateway::infrastructure::http::{AppState, create_router};
use quote_gateway::infrastructure::stream::ExchangeCalendar;
use quote_gateway::infrastructure::yahoo::YahooFinanceClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environments set variables directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env();
    tracing::info!(
        port = config.server.port,
        upstream = %config.provider.base_url,
        cache_ttl_secs = config.cache.ttl.as_secs(),
        "starting quote gateway"
    );

    let provider = Arc::new(
        YahooFinanceClient::new(&config.provider).context("failed to build upstream client")?,
    );
    let cache = ChartCache::new(
        config.cache.ttl,
        config.cache.capacity,
        Arc::new(SystemClock),
    );
    let state = Arc::new(AppState {
        provider: provider.clone(),
        charts: ChartService::new(provider, cache),
        calendar: Arc::new(ExchangeCalendar),
        stream: config.stream.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("quote gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
