//! Yahoo Finance HTTP client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

use crate::application::ports::{MarketDataError, MarketDataPort, SearchMatch};
use crate::domain::candle::{Candle, ChartInterval, ChartRange};
use crate::domain::hours;
use crate::domain::quote::{MarketStatus, Quote};
use crate::infrastructure::config::ProviderSettings;

use super::messages::{ChartEnvelope, QuoteEnvelope, RawQuote, SearchEnvelope};
use super::retry::ChartRetryPolicy;
use super::throttle::RateGate;

// Upstream rejects requests from default HTTP client agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/95.0.4638.69 Safari/537.36";

/// Market data provider backed by Yahoo Finance's public endpoints.
///
/// Stateless across calls apart from the rate gate: one request in flight
/// at a time, spaced by the configured minimum interval, each carrying a
/// hard timeout.
#[derive(Debug)]
pub struct YahooFinanceClient {
    http: reqwest::Client,
    base_url: String,
    gate: RateGate,
    retry: ChartRetryPolicy,
}

impl YahooFinanceClient {
    /// Build a client from provider settings.
    pub fn new(settings: &ProviderSettings) -> Result<Self, MarketDataError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json,text/html;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            gate: RateGate::new(settings.min_request_spacing),
            retry: ChartRetryPolicy::linear(
                settings.chart_retry_attempts,
                settings.chart_retry_base_delay,
            ),
        })
    }

    async fn fetch_raw_quote(&self, symbol: &str) -> Result<RawQuote, MarketDataError> {
        let _permit = self.gate.acquire().await;

        let url = format!("{}/v7/finance/quote", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("symbols", symbol)])
            .send()
            .await
            .map_err(map_transport_error)?;
        let envelope: QuoteEnvelope = decode(response).await?;

        envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or(MarketDataError::EmptyResult)
    }

    async fn fetch_chart_once(
        &self,
        symbol: &str,
        window: (DateTime<Utc>, DateTime<Utc>),
        interval: ChartInterval,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let _permit = self.gate.acquire().await;

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("period1", window.0.timestamp().to_string()),
                ("period2", window.1.timestamp().to_string()),
                ("interval", interval.as_str().to_string()),
                ("includePrePost", "true".to_string()),
                ("events", "div,splits".to_string()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;
        let envelope: ChartEnvelope = decode(response).await?;

        if let Some(error) = envelope.chart.error {
            tracing::warn!(symbol, %error, "upstream chart error payload");
            return Err(MarketDataError::EmptyResult);
        }

        let candles = envelope
            .chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .map(super::messages::ChartData::into_candles)
            .unwrap_or_default();

        if candles.is_empty() {
            return Err(MarketDataError::EmptyResult);
        }
        Ok(candles)
    }
}

#[async_trait]
impl MarketDataPort for YahooFinanceClient {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let raw = self.fetch_raw_quote(symbol).await?;
        let now = Utc::now();
        let status = MarketStatus::from_open(hours::is_market_open(symbol, now));
        Ok(raw.into_quote(status, now))
    }

    async fn get_chart(
        &self,
        symbol: &str,
        range: ChartRange,
        interval: ChartInterval,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let window = range.period_window(symbol, Utc::now());
        let mut last_error = MarketDataError::EmptyResult;

        // Bounded loop, not recursion: the policy owns the schedule.
        for attempt in 1..=self.retry.attempts() {
            match self.fetch_chart_once(symbol, window, interval).await {
                Ok(candles) if candles.len() >= range.min_bar_count() => {
                    tracing::debug!(symbol, %range, bars = candles.len(), attempt, "chart fetched");
                    return Ok(candles);
                }
                Ok(candles) => {
                    tracing::warn!(
                        symbol,
                        %range,
                        bars = candles.len(),
                        required = range.min_bar_count(),
                        attempt,
                        "sparse chart response"
                    );
                    last_error = MarketDataError::EmptyResult;
                }
                Err(error) => {
                    tracing::warn!(symbol, %range, attempt, %error, "chart fetch failed");
                    last_error = error;
                }
            }

            if attempt < self.retry.attempts() {
                tokio::time::sleep(self.retry.delay_after(attempt)).await;
            }
        }

        Err(last_error)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, MarketDataError> {
        let _permit = self.gate.acquire().await;

        let url = format!("{}/v1/finance/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", query),
                ("quotesCount", "10"),
                ("newsCount", "0"),
                ("enableFuzzyQuery", "true"),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;
        let envelope: SearchEnvelope = decode(response).await?;

        Ok(envelope.quotes)
    }
}

fn map_transport_error(error: reqwest::Error) -> MarketDataError {
    if error.is_timeout() {
        MarketDataError::Timeout
    } else {
        MarketDataError::Network(error.to_string())
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, MarketDataError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(MarketDataError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| MarketDataError::Parse(e.to_string()))
}
