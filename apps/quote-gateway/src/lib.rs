// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Quote Gateway - Core Library
//!
//! Market data gateway for live stock quotes and chart history: wraps the
//! Yahoo Finance endpoints behind a rate-limited, retrying client, caches
//! chart responses, and fans quotes out to subscribers over server-sent
//! events on a market-hours-aware cadence.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure market-data logic
//!   - `symbol`: Symbol normalization (Korean numeric codes, exchange suffixes)
//!   - `hours`: Exchange trading-hours calendar (KRX, NYSE/Nasdaq)
//!   - `quote`: Formatted quote snapshot and market status
//!   - `candle`: OHLCV bars, chart ranges and intervals
//!
//! - **Application**: Ports and orchestration
//!   - `ports`: `MarketDataPort` interface over the upstream source
//!   - `services`: `ChartService` (cache-fronted chart retrieval)
//!
//! - **Infrastructure**: Adapters
//!   - `yahoo`: Yahoo Finance HTTP client (throttle, retry, wire decoding)
//!   - `cache`: TTL chart cache with injected clock
//!   - `stream`: Per-subscriber quote stream sessions
//!   - `http`: Axum router and SSE endpoint
//!   - `config`: Environment-driven settings
//!
//! - **Client**: Consumer-side subscriber with bounded auto-reconnect.

/// Application layer.
pub mod application;
/// Consumer-side stream client.
pub mod client;
/// Domain layer.
pub mod domain;
/// Infrastructure layer.
pub mod infrastructure;
