//! HTTP/SSE API server.
//!
//! Exposes the gateway's market data endpoints and upgrades quote
//! subscriptions to server-sent event streams backed by per-subscriber
//! [`StreamSession`] tasks.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    response::IntoResponse,
    routing::get,
};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::application::ports::{MarketDataError, MarketDataPort};
use crate::application::services::ChartService;
use crate::domain::candle::{ChartInterval, ChartRange};
use crate::domain::quote::Quote;
use crate::domain::symbol;
use crate::infrastructure::config::StreamSettings;
use crate::infrastructure::stream::{MarketCalendar, SessionHandle, StreamFrame, StreamSession};

/// Index basket served by the market overview endpoint:
/// S&P 500, Dow Jones, Nasdaq, KOSPI, KOSDAQ.
pub const MARKET_INDICES: [&str; 5] = ["^GSPC", "^DJI", "^IXIC", "^KS11", "^KQ11"];

/// Shared state for the HTTP server.
pub struct AppState {
    /// Upstream market data source.
    pub provider: Arc<dyn MarketDataPort>,
    /// Cache-fronted chart retrieval.
    pub charts: ChartService,
    /// Market-open oracle for stream cadence.
    pub calendar: Arc<dyn MarketCalendar>,
    /// Stream cadence settings.
    pub stream: StreamSettings,
}

/// Create the Axum router with all endpoints.
#[must_use]
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stock/quote/{symbol}/initial", get(initial_quote))
        .route("/stock/quote/{symbol}", get(stream_quote))
        .route("/stock/chart/{symbol}", get(chart))
        .route("/stock/search", get(search))
        .route("/stock/market-overview", get(market_overview))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// One formatted quote snapshot, fetched on demand.
async fn initial_quote(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<Quote>, ApiError> {
    let symbol = symbol::normalize(&symbol);
    tracing::info!(symbol, "initial quote requested");
    let quote = state.provider.get_quote(&symbol).await?;
    Ok(Json(quote))
}

/// Live quote stream over server-sent events.
///
/// Emits a `connected` event immediately, then quote data frames on the
/// market-hours-aware cadence, plus keep-alive comments every 30 s. The
/// session dies with the connection: dropping the response body cancels
/// the handle.
async fn stream_quote(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Sse<SessionStream> {
    let symbol = symbol::normalize(&symbol);
    tracing::info!(symbol, "quote stream subscribed");
    let (rx, handle) = StreamSession::spawn(
        symbol,
        state.provider.clone(),
        state.calendar.clone(),
        state.stream.clone(),
    );
    Sse::new(SessionStream {
        rx,
        _handle: handle,
    })
}

/// Chart request parameters.
#[derive(Debug, Deserialize)]
struct ChartParams {
    range: Option<String>,
    interval: Option<String>,
}

/// Candle series for a symbol, cache-first.
async fn chart(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<ChartParams>,
) -> Result<Json<Vec<crate::domain::candle::Candle>>, ApiError> {
    let range: ChartRange = params
        .range
        .as_deref()
        .unwrap_or("1d")
        .parse()
        .map_err(|_| ApiError::bad_request("unsupported chart range"))?;
    // The effective interval is coerced from the range, but a nonsense
    // interval parameter is still a client error.
    let _interval: ChartInterval = params
        .interval
        .as_deref()
        .unwrap_or("5m")
        .parse()
        .map_err(|_| ApiError::bad_request("unsupported chart interval"))?;

    let symbol = symbol::normalize(&symbol);
    tracing::info!(symbol, %range, "chart requested");
    let candles = state.charts.get_chart(&symbol, range).await?;
    Ok(Json(candles))
}

/// Search request parameters.
#[derive(Debug, Deserialize)]
struct SearchParams {
    query: Option<String>,
}

/// Symbol search pass-through.
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("query parameter is required"))?;

    tracing::info!(query, "symbol search");
    let matches = state.provider.search(query).await?;
    Ok(Json(matches))
}

/// Formatted quotes for the fixed index basket. Entries that fail to
/// fetch are omitted, not error-producing.
async fn market_overview(State(state): State<Arc<AppState>>) -> Json<Vec<Quote>> {
    let mut quotes = Vec::with_capacity(MARKET_INDICES.len());
    for symbol in MARKET_INDICES {
        match state.provider.get_quote(symbol).await {
            Ok(quote) => quotes.push(quote),
            Err(error) => {
                tracing::warn!(symbol, %error, "index quote skipped");
            }
        }
    }
    Json(quotes)
}

/// SSE body: session frames rendered as events, with the session handle
/// held so a dropped connection cancels the session.
pub struct SessionStream {
    rx: mpsc::Receiver<StreamFrame>,
    _handle: SessionHandle,
}

impl Stream for SessionStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx
            .poll_recv(cx)
            .map(|frame| frame.map(|f| Ok(frame_to_event(&f))))
    }
}

fn frame_to_event(frame: &StreamFrame) -> Event {
    match frame {
        StreamFrame::Connected => Event::default()
            .event("connected")
            .data(json!({"status": "connected"}).to_string()),
        StreamFrame::Quote(quote) => match serde_json::to_string(quote) {
            Ok(data) => Event::default().data(data),
            Err(error) => Event::default()
                .event("error")
                .data(json!({"error": error.to_string()}).to_string()),
        },
        StreamFrame::Error { message } => Event::default()
            .event("error")
            .data(json!({"error": message}).to_string()),
        StreamFrame::Heartbeat => Event::default().comment("keepalive"),
    }
}

/// API error rendered as `{ "error": ... }` with a mapped status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Client error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<MarketDataError> for ApiError {
    fn from(error: MarketDataError) -> Self {
        if error.is_not_found() {
            Self {
                status: StatusCode::NOT_FOUND,
                message: "no data found for the requested symbol".to_string(),
            }
        } else {
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: error.to_string(),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}
