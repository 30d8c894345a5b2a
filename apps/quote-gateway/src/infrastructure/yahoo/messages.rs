//! Yahoo Finance wire formats.
//!
//! Response envelopes for the v7 quote, v8 chart and v1 search endpoints,
//! plus the mapping into domain types. Chart indicators arrive as parallel
//! arrays with nullable entries; the mapping zips them and applies the
//! candle validation rules.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::application::ports::SearchMatch;
use crate::domain::candle::Candle;
use crate::domain::quote::{MarketStatus, Quote};

/// Envelope of `/v7/finance/quote`.
#[derive(Debug, Deserialize)]
pub struct QuoteEnvelope {
    /// Result wrapper.
    #[serde(rename = "quoteResponse")]
    pub quote_response: QuoteResponse,
}

/// Quote result list.
#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    /// One entry per requested symbol.
    #[serde(default)]
    pub result: Vec<RawQuote>,
}

/// One raw quote as reported upstream.
#[derive(Debug, Deserialize)]
pub struct RawQuote {
    /// Exchange-qualified ticker.
    pub symbol: String,
    /// Short display name.
    #[serde(rename = "shortName")]
    pub short_name: Option<String>,
    /// Long display name.
    #[serde(rename = "longName")]
    pub long_name: Option<String>,
    /// Last traded price.
    #[serde(rename = "regularMarketPrice")]
    pub regular_market_price: Option<f64>,
    /// Absolute change since previous close.
    #[serde(rename = "regularMarketChange")]
    pub regular_market_change: Option<f64>,
    /// Percentage change since previous close.
    #[serde(rename = "regularMarketChangePercent")]
    pub regular_market_change_percent: Option<f64>,
    /// Traded volume.
    #[serde(rename = "regularMarketVolume")]
    pub regular_market_volume: Option<u64>,
    /// Market capitalization.
    #[serde(rename = "marketCap")]
    pub market_cap: Option<u64>,
    /// Home exchange code.
    pub exchange: Option<String>,
    /// 52-week high.
    #[serde(rename = "fiftyTwoWeekHigh")]
    pub fifty_two_week_high: Option<f64>,
    /// 52-week low.
    #[serde(rename = "fiftyTwoWeekLow")]
    pub fifty_two_week_low: Option<f64>,
}

impl RawQuote {
    /// Format into a domain quote. Absent numeric fields default to zero;
    /// the timestamp is the formatting instant, not the fetch instant.
    #[must_use]
    pub fn into_quote(self, status: MarketStatus, formatted_at: DateTime<Utc>) -> Quote {
        Quote {
            symbol: self.symbol,
            name: self.short_name.or(self.long_name),
            price: self.regular_market_price.unwrap_or(0.0),
            change: self.regular_market_change.unwrap_or(0.0),
            change_percent: self.regular_market_change_percent.unwrap_or(0.0),
            volume: self.regular_market_volume.unwrap_or(0),
            market_cap: self.market_cap,
            exchange: self.exchange,
            fifty_two_week_high: self.fifty_two_week_high,
            fifty_two_week_low: self.fifty_two_week_low,
            market_status: status,
            timestamp: formatted_at,
        }
    }
}

/// Envelope of `/v8/finance/chart/{symbol}`.
#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    /// Result wrapper.
    pub chart: ChartResponse,
}

/// Chart result list.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    /// One entry for the requested symbol.
    pub result: Option<Vec<ChartData>>,
    /// Upstream error object, if any.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Parallel-array chart payload.
#[derive(Debug, Deserialize)]
pub struct ChartData {
    /// Bucket timestamps, epoch seconds.
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    /// OHLCV indicator arrays.
    pub indicators: Indicators,
}

/// Indicator wrapper.
#[derive(Debug, Deserialize)]
pub struct Indicators {
    /// OHLCV arrays, usually exactly one entry.
    #[serde(default)]
    pub quote: Vec<QuoteIndicators>,
}

/// Nullable OHLCV arrays parallel to the timestamp array.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteIndicators {
    /// Opening prices.
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    /// High prices.
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    /// Low prices.
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    /// Closing prices.
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    /// Traded volumes.
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

impl ChartData {
    /// Zip the parallel arrays into validated candles, dropping bars that
    /// fail validation. Output length never exceeds input length.
    #[must_use]
    pub fn into_candles(self) -> Vec<Candle> {
        let timestamps = self.timestamp.unwrap_or_default();
        let quote = self.indicators.quote.into_iter().next().unwrap_or_default();

        let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

        timestamps
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                Candle::from_parts(
                    Some(ts),
                    at(&quote.open, i),
                    at(&quote.high, i),
                    at(&quote.low, i),
                    at(&quote.close, i),
                    quote.volume.get(i).copied().flatten(),
                )
            })
            .collect()
    }
}

/// Envelope of `/v1/finance/search`.
#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    /// Symbol matches.
    #[serde(default)]
    pub quotes: Vec<SearchMatch>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_mapping_applies_defaults() {
        let raw: RawQuote = serde_json::from_str(r#"{"symbol":"005930.KS"}"#).unwrap();
        let quote = raw.into_quote(MarketStatus::Closed, Utc::now());

        assert_eq!(quote.symbol, "005930.KS");
        assert_eq!(quote.price, 0.0);
        assert_eq!(quote.change_percent, 0.0);
        assert_eq!(quote.volume, 0);
        assert!(quote.market_cap.is_none());
    }

    #[test]
    fn quote_name_prefers_short_name() {
        let raw: RawQuote = serde_json::from_str(
            r#"{"symbol":"AAPL","shortName":"Apple","longName":"Apple Inc."}"#,
        )
        .unwrap();
        let quote = raw.into_quote(MarketStatus::Open, Utc::now());
        assert_eq!(quote.name.as_deref(), Some("Apple"));
    }

    #[test]
    fn chart_mapping_drops_invalid_bars() {
        let data = ChartData {
            timestamp: Some(vec![1_717_400_000, 1_717_400_300, 1_717_400_600]),
            indicators: Indicators {
                quote: vec![QuoteIndicators {
                    open: vec![Some(10.0), None, Some(12.0)],
                    high: vec![Some(10.5), None, Some(12.5)],
                    low: vec![Some(9.5), None, Some(11.5)],
                    close: vec![Some(10.2), None, Some(12.2)],
                    volume: vec![Some(100), None, Some(300)],
                }],
            },
        };

        let candles = data.into_candles();
        assert_eq!(candles.len(), 2);
        assert!(candles.iter().all(|c| c.close > 0.0));
    }

    #[test]
    fn chart_mapping_handles_missing_arrays() {
        let data = ChartData {
            timestamp: None,
            indicators: Indicators { quote: vec![] },
        };
        assert!(data.into_candles().is_empty());
    }

    #[test]
    fn search_envelope_defaults_to_empty() {
        let envelope: SearchEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.quotes.is_empty());
    }
}
