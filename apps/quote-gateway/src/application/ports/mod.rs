//! Market data provider port.
//!
//! The gateway consumes an abstract symbol -> quote/candles source. The
//! production implementation is the Yahoo Finance client in the
//! infrastructure layer; tests substitute stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::candle::{Candle, ChartInterval, ChartRange};
use crate::domain::quote::Quote;

/// Upstream market data failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketDataError {
    /// The upstream call exceeded its deadline.
    #[error("upstream request timed out")]
    Timeout,
    /// Structurally valid but empty or unusably sparse payload.
    #[error("upstream returned no usable data")]
    EmptyResult,
    /// Transport-level failure.
    #[error("upstream network error: {0}")]
    Network(String),
    /// Upstream responded with a non-success status.
    #[error("upstream API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("upstream response parse error: {0}")]
    Parse(String),
}

impl MarketDataError {
    /// Whether the failure means "no data for this symbol" rather than a
    /// fault, and should surface as a 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::EmptyResult | Self::Api { status: 404, .. })
    }
}

/// One symbol search match, passed through from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    /// Exchange-qualified ticker.
    pub symbol: String,
    /// Home exchange code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    /// Short display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortname: Option<String>,
    /// Long display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longname: Option<String>,
    /// Instrument type, e.g. `EQUITY` or `INDEX`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_type: Option<String>,
}

/// Abstract market data source.
///
/// Implementations own their network discipline (timeouts, request
/// spacing, chart retries); callers own the caching and streaming cadence.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch a quote snapshot. Single attempt; the streaming loop retries
    /// by cadence, not inline.
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Fetch a candle series. Implementations retry internally on
    /// empty/error responses before surfacing the last error.
    async fn get_chart(
        &self,
        symbol: &str,
        range: ChartRange,
        interval: ChartInterval,
    ) -> Result<Vec<Candle>, MarketDataError>;

    /// Search for symbols. Single attempt; an empty result is valid.
    async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, MarketDataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        assert!(MarketDataError::EmptyResult.is_not_found());
        assert!(
            MarketDataError::Api {
                status: 404,
                message: "gone".to_string()
            }
            .is_not_found()
        );
        assert!(!MarketDataError::Timeout.is_not_found());
        assert!(
            !MarketDataError::Api {
                status: 500,
                message: "boom".to_string()
            }
            .is_not_found()
        );
    }

    #[test]
    fn search_match_tolerates_missing_fields() {
        let m: SearchMatch = serde_json::from_str(r#"{"symbol":"AAPL"}"#).unwrap();
        assert_eq!(m.symbol, "AAPL");
        assert!(m.exchange.is_none());
    }
}
