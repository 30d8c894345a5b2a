//! Per-subscriber quote streaming.
//!
//! Each subscriber gets one [`StreamSession`] task that pushes formatted
//! quotes on a cadence adapted to whether the symbol's market is open,
//! plus a liveness heartbeat. Session lifecycle:
//!
//! ```text
//! Connecting ──(connected frame + initial quote)──► Streaming ──► Closed
//! ```
//!
//! `Closed` is terminal and reached from every exit path: subscriber gone
//! (channel closed), transport error, or explicit cancel. Both cadences
//! die with the task, and a fetch resolving after cancellation is
//! discarded rather than pushed to a dead transport.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::application::ports::MarketDataPort;
use crate::domain::hours;
use crate::domain::quote::Quote;
use crate::infrastructure::config::StreamSettings;

/// Market-open oracle, injectable so cadence tests control the calendar.
pub trait MarketCalendar: Send + Sync {
    /// Whether the symbol's home exchange is open right now.
    fn is_open(&self, symbol: &str) -> bool;
}

/// Production calendar backed by the canonical trading-hours check.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExchangeCalendar;

impl MarketCalendar for ExchangeCalendar {
    fn is_open(&self, symbol: &str) -> bool {
        hours::is_market_open(symbol, Utc::now())
    }
}

/// One frame pushed to a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// Subscription acknowledged; emitted once, first.
    Connected,
    /// A fresh quote snapshot.
    Quote(Quote),
    /// A tick's fetch failed; the stream stays open and retries on the
    /// next tick.
    Error {
        /// Human-readable failure description.
        message: String,
    },
    /// No-op keep-alive.
    Heartbeat,
}

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Connecting,
    Streaming,
    Closed,
}

/// The transport is gone or the session was cancelled.
struct SessionEnded;

/// Cancel handle for one session. Cancelling is idempotent; dropping the
/// handle cancels too, which ties the session to its consumer.
#[derive(Debug)]
pub struct SessionHandle {
    cancel: CancellationToken,
}

impl SessionHandle {
    /// Tear the session down. Safe to call more than once.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// One subscriber's live quote push loop.
pub struct StreamSession {
    symbol: String,
    provider: Arc<dyn MarketDataPort>,
    calendar: Arc<dyn MarketCalendar>,
    settings: StreamSettings,
    cancel: CancellationToken,
    tx: mpsc::Sender<StreamFrame>,
    state: SessionState,
}

impl StreamSession {
    /// Spawn a session for `symbol`, returning the frame receiver and the
    /// cancel handle.
    #[must_use]
    pub fn spawn(
        symbol: String,
        provider: Arc<dyn MarketDataPort>,
        calendar: Arc<dyn MarketCalendar>,
        settings: StreamSettings,
    ) -> (mpsc::Receiver<StreamFrame>, SessionHandle) {
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let session = Self {
            symbol,
            provider,
            calendar,
            settings,
            cancel: cancel.clone(),
            tx,
            state: SessionState::Connecting,
        };
        tokio::spawn(session.run());

        (rx, SessionHandle { cancel })
    }

    /// Drive the session until the subscriber disconnects or the handle is
    /// cancelled.
    async fn run(mut self) {
        tracing::debug!(symbol = %self.symbol, "stream session connecting");

        // The first push is synchronous with subscribe, not deferred to
        // the first tick. The session moves to Streaming even when the
        // initial fetch fails; the next tick retries.
        if self.push(StreamFrame::Connected).await.is_err() {
            return self.finish();
        }
        if self.data_tick().await.is_err() {
            return self.finish();
        }
        self.state = SessionState::Streaming;

        let mut market_open = self.calendar.is_open(&self.symbol);
        let mut data = interval_after(self.update_period(market_open));
        let mut heartbeat = interval_after(self.settings.heartbeat_interval);
        tracing::debug!(symbol = %self.symbol, market_open, "stream session streaming");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = data.tick() => {
                    let open_now = self.calendar.is_open(&self.symbol);
                    if open_now != market_open {
                        market_open = open_now;
                        data = interval_after(self.update_period(market_open));
                        tracing::debug!(symbol = %self.symbol, market_open, "data cadence rescheduled");
                    }
                    if self.data_tick().await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if self.push(StreamFrame::Heartbeat).await.is_err() {
                        break;
                    }
                }
            }
        }

        self.finish();
    }

    const fn update_period(&self, market_open: bool) -> Duration {
        if market_open {
            self.settings.open_interval
        } else {
            self.settings.closed_interval
        }
    }

    /// Fetch one quote and push it. A fetch failure degrades to an error
    /// frame; only a dead transport or cancellation ends the session.
    async fn data_tick(&mut self) -> Result<(), SessionEnded> {
        let result = self.provider.get_quote(&self.symbol).await;

        // The fetch may have resolved after cancellation; discard it.
        if self.cancel.is_cancelled() {
            return Err(SessionEnded);
        }

        match result {
            Ok(quote) => self.push(StreamFrame::Quote(quote)).await,
            Err(error) => {
                tracing::warn!(symbol = %self.symbol, %error, "quote tick failed");
                self.push(StreamFrame::Error {
                    message: error.to_string(),
                })
                .await
            }
        }
    }

    async fn push(&self, frame: StreamFrame) -> Result<(), SessionEnded> {
        tokio::select! {
            () = self.cancel.cancelled() => Err(SessionEnded),
            sent = self.tx.send(frame) => sent.map_err(|_| SessionEnded),
        }
    }

    /// Converge every exit path on one idempotent cleanup.
    fn finish(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.cancel.cancel();
        tracing::debug!(symbol = %self.symbol, "stream session closed");
    }
}

fn interval_after(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
