//! Consumer-side stream client.
//!
//! Subscribes to a gateway quote stream, keeps a local "current quote"
//! cell fresh, and recovers from transient drops with a bounded fixed-delay
//! reconnect. State is published through a `watch` channel so a UI can
//! render the latest quote, a "disconnected" indicator while reconnecting,
//! and a terminal error once the retry budget is spent.

pub mod sse;

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::domain::quote::Quote;
use crate::domain::symbol;

use sse::{SseFrame, SseParser};

/// Stream client configuration.
#[derive(Debug, Clone)]
pub struct StreamClientConfig {
    /// Gateway base URL, e.g. `http://localhost:8025`.
    pub base_url: String,
    /// Reconnect attempts after a drop before giving up.
    pub max_retries: u32,
    /// Fixed delay between reconnect attempts.
    pub retry_delay: Duration,
}

impl StreamClientConfig {
    /// Config with the default retry budget (3 attempts, 3 s apart).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_retries: 3,
            retry_delay: Duration::from_secs(3),
        }
    }
}

/// Connection lifecycle as visible to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// First connection attempt in progress.
    Connecting,
    /// Stream open and delivering frames.
    Connected,
    /// Dropped; a reconnect is scheduled.
    Reconnecting,
    /// Retry budget exhausted. Requires manual action (resubscribe).
    Failed,
    /// Explicitly unsubscribed.
    Disconnected,
}

/// Consumer-visible subscription state.
#[derive(Debug, Clone)]
pub struct QuoteView {
    /// Connection lifecycle.
    pub connection: ConnectionState,
    /// Last-known-good quote, kept across transient errors.
    pub quote: Option<Quote>,
    /// Most recent error message, if any.
    pub last_error: Option<String>,
}

/// Stream client construction failure.
#[derive(Debug, thiserror::Error)]
pub enum StreamClientError {
    /// The underlying HTTP client could not be built.
    #[error("http client error: {0}")]
    Http(String),
}

/// Client for gateway quote streams.
#[derive(Debug, Clone)]
pub struct QuoteStreamClient {
    http: reqwest::Client,
    config: StreamClientConfig,
}

impl QuoteStreamClient {
    /// Build a client. The connection itself is long-lived, so only the
    /// connect phase carries a timeout.
    pub fn new(config: StreamClientConfig) -> Result<Self, StreamClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StreamClientError::Http(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Subscribe to live quotes for `symbol` (normalized first).
    ///
    /// The subscription runs until [`Subscription::unsubscribe`] or drop.
    #[must_use]
    pub fn subscribe(&self, symbol: &str) -> Subscription {
        let symbol = symbol::normalize(symbol);
        let (tx, rx) = watch::channel(QuoteView {
            connection: ConnectionState::Connecting,
            quote: None,
            last_error: None,
        });
        let cancel = CancellationToken::new();

        let worker = Worker {
            http: self.http.clone(),
            config: self.config.clone(),
            symbol,
            tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(worker.run());

        Subscription { state: rx, cancel }
    }
}

/// Handle to one live subscription.
#[derive(Debug)]
pub struct Subscription {
    state: watch::Receiver<QuoteView>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Watch the subscription state.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<QuoteView> {
        self.state.clone()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> QuoteView {
        self.state.borrow().clone()
    }

    /// Stop the subscription. Idempotent; a reconnect scheduled just
    /// before this call is cancelled, not fired into a dead context.
    pub fn unsubscribe(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum ReadEnd {
    Cancelled,
    Transport,
}

struct Worker {
    http: reqwest::Client,
    config: StreamClientConfig,
    symbol: String,
    tx: watch::Sender<QuoteView>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        let url = format!(
            "{}/stock/quote/{}",
            self.config.base_url.trim_end_matches('/'),
            self.symbol
        );
        let mut retries = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match self.open_stream(&url).await {
                Ok(response) => {
                    retries = 0;
                    self.update(|view| {
                        view.connection = ConnectionState::Connected;
                    });
                    tracing::debug!(symbol = %self.symbol, "stream connected");

                    if matches!(self.read_frames(response).await, ReadEnd::Cancelled) {
                        break;
                    }
                }
                Err(error) => {
                    tracing::warn!(symbol = %self.symbol, %error, "stream connect failed");
                }
            }

            if self.cancel.is_cancelled() {
                break;
            }

            if retries >= self.config.max_retries {
                tracing::warn!(symbol = %self.symbol, "reconnect budget exhausted");
                self.update(|view| {
                    view.connection = ConnectionState::Failed;
                    view.last_error =
                        Some("connection failed: maximum reconnect attempts exceeded".to_string());
                });
                return;
            }

            retries += 1;
            self.update(|view| {
                view.connection = ConnectionState::Reconnecting;
            });
            tracing::info!(
                symbol = %self.symbol,
                attempt = retries,
                max = self.config.max_retries,
                "reconnecting"
            );

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.config.retry_delay) => {}
            }
        }

        self.update(|view| {
            if view.connection != ConnectionState::Failed {
                view.connection = ConnectionState::Disconnected;
            }
        });
    }

    async fn open_stream(&self, url: &str) -> Result<reqwest::Response, StreamClientError> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| StreamClientError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamClientError::Http(format!(
                "unexpected status {status}"
            )));
        }
        Ok(response)
    }

    async fn read_frames(&self, response: reqwest::Response) -> ReadEnd {
        let mut parser = SseParser::new();
        let mut body = response.bytes_stream();

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return ReadEnd::Cancelled,
                chunk = body.next() => match chunk {
                    Some(Ok(bytes)) => {
                        for frame in parser.push(&bytes) {
                            self.handle_frame(&frame);
                        }
                    }
                    Some(Err(error)) => {
                        tracing::warn!(symbol = %self.symbol, %error, "stream read failed");
                        return ReadEnd::Transport;
                    }
                    None => {
                        tracing::debug!(symbol = %self.symbol, "stream ended by server");
                        return ReadEnd::Transport;
                    }
                },
            }
        }
    }

    /// Apply one frame. Error frames surface without closing; quote
    /// frames replace the current value.
    fn handle_frame(&self, frame: &SseFrame) {
        match frame.event.as_deref() {
            Some("connected") => {}
            Some("error") => {
                let message = serde_json::from_str::<serde_json::Value>(&frame.data)
                    .ok()
                    .and_then(|v| v.get("error").and_then(|e| e.as_str().map(String::from)))
                    .unwrap_or_else(|| frame.data.clone());
                self.update(|view| view.last_error = Some(message.clone()));
            }
            _ => match serde_json::from_str::<Quote>(&frame.data) {
                Ok(quote) => self.update(|view| {
                    view.quote = Some(quote.clone());
                    view.last_error = None;
                }),
                Err(error) => {
                    tracing::warn!(symbol = %self.symbol, %error, "undecodable quote frame");
                    self.update(|view| view.last_error = Some("malformed quote frame".to_string()));
                }
            },
        }
    }

    fn update(&self, mutate: impl Fn(&mut QuoteView)) {
        self.tx.send_modify(mutate);
    }
}
