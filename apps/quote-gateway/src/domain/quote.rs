//! Quote snapshots.
//!
//! A [`Quote`] is a point-in-time price/volume snapshot for one symbol,
//! formatted for the wire. Quotes are ephemeral - each one replaces the
//! previous in-memory value for its subscriber, nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the symbol's home exchange is currently trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketStatus {
    /// Exchange is inside its trading window.
    #[serde(rename = "OPEN")]
    Open,
    /// Exchange is closed (off-hours or weekend).
    #[serde(rename = "CLOSED")]
    Closed,
}

impl MarketStatus {
    /// Build a status from a market-open flag.
    #[must_use]
    pub const fn from_open(open: bool) -> Self {
        if open { Self::Open } else { Self::Closed }
    }

    /// Check whether this status is open.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// A formatted price snapshot for one symbol.
///
/// Field names follow the JSON wire format consumed by the dashboard.
/// `timestamp` is set at formatting time, not at source-fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Exchange-qualified ticker, e.g. `AAPL` or `005930.KS`.
    pub symbol: String,
    /// Display name (short name, falling back to long name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Last traded price.
    pub price: f64,
    /// Absolute change since previous close.
    pub change: f64,
    /// Percentage change since previous close.
    pub change_percent: f64,
    /// Traded volume.
    pub volume: u64,
    /// Market capitalization, absent for indices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<u64>,
    /// Home exchange code as reported upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// 52-week high.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_high: Option<f64>,
    /// 52-week low.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fifty_two_week_low: Option<f64>,
    /// Market status at formatting time.
    pub market_status: MarketStatus,
    /// Formatting instant, RFC 3339.
    pub timestamp: DateTime<Utc>,
}
