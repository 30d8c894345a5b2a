//! Upstream client tests against a mocked Yahoo Finance server.

use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quote_gateway::application::ports::{MarketDataError, MarketDataPort};
use quote_gateway::domain::candle::{ChartInterval, ChartRange};
use quote_gateway::infrastructure::config::ProviderSettings;
use quote_gateway::infrastructure::yahoo::YahooFinanceClient;

/// Settings pointed at the mock server with retry/spacing delays zeroed,
/// so the bounded retry loop runs without real waiting.
fn fast_settings(base_url: &str) -> ProviderSettings {
    ProviderSettings {
        base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(5),
        min_request_spacing: Duration::ZERO,
        chart_retry_attempts: 3,
        chart_retry_base_delay: Duration::ZERO,
    }
}

fn quote_body(symbol: &str) -> Value {
    json!({
        "quoteResponse": {
            "result": [{
                "symbol": symbol,
                "shortName": "Apple",
                "longName": "Apple Inc.",
                "regularMarketPrice": 182.5,
                "regularMarketChange": -1.25,
                "regularMarketChangePercent": -0.68,
                "regularMarketVolume": 55_000_000_u64,
                "marketCap": 2_800_000_000_000_u64,
                "exchange": "NMS",
                "fiftyTwoWeekHigh": 199.6,
                "fiftyTwoWeekLow": 124.2
            }],
            "error": null
        }
    })
}

fn chart_body(bars: usize) -> Value {
    let timestamps: Vec<i64> = (0..bars).map(|i| 1_717_400_000 + i as i64 * 300).collect();
    let prices: Vec<f64> = (0..bars).map(|i| 100.0 + i as f64).collect();
    let volumes: Vec<u64> = vec![1_000; bars];
    json!({
        "chart": {
            "result": [{
                "timestamp": timestamps,
                "indicators": {
                    "quote": [{
                        "open": prices,
                        "high": prices,
                        "low": prices,
                        "close": prices,
                        "volume": volumes
                    }]
                }
            }],
            "error": null
        }
    })
}

#[tokio::test]
async fn quote_fetch_parses_the_wire_format() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .and(query_param("symbols", "AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(quote_body("AAPL")))
        .expect(1)
        .mount(&server)
        .await;

    let client = YahooFinanceClient::new(&fast_settings(&server.uri())).unwrap();
    let quote = client.get_quote("AAPL").await.unwrap();

    assert_eq!(quote.symbol, "AAPL");
    assert_eq!(quote.name.as_deref(), Some("Apple"));
    assert_eq!(quote.price, 182.5);
    assert_eq!(quote.volume, 55_000_000);
    assert_eq!(quote.exchange.as_deref(), Some("NMS"));
}

#[tokio::test]
async fn empty_quote_result_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"quoteResponse": {"result": [], "error": null}})),
        )
        .mount(&server)
        .await;

    let client = YahooFinanceClient::new(&fast_settings(&server.uri())).unwrap();
    let error = client.get_quote("NOPE").await.unwrap_err();

    assert!(matches!(error, MarketDataError::EmptyResult));
    assert!(error.is_not_found());
}

#[tokio::test]
async fn upstream_404_surfaces_as_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let client = YahooFinanceClient::new(&fast_settings(&server.uri())).unwrap();
    let error = client.get_quote("GONE").await.unwrap_err();

    assert!(matches!(error, MarketDataError::Api { status: 404, .. }));
    assert!(error.is_not_found());
}

#[tokio::test]
async fn persistent_empty_chart_is_retried_exactly_three_times() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"chart": {"result": [], "error": null}})),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = YahooFinanceClient::new(&fast_settings(&server.uri())).unwrap();
    let error = client
        .get_chart("AAPL", ChartRange::OneDay, ChartInterval::FiveMinutes)
        .await
        .unwrap_err();

    assert!(matches!(error, MarketDataError::EmptyResult));
}

#[tokio::test]
async fn sparse_chart_exhausts_the_retry_budget() {
    let server = MockServer::start().await;
    // Well under the 1d minimum of half the expected 78 bars.
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(5)))
        .expect(3)
        .mount(&server)
        .await;

    let client = YahooFinanceClient::new(&fast_settings(&server.uri())).unwrap();
    let error = client
        .get_chart("AAPL", ChartRange::OneDay, ChartInterval::FiveMinutes)
        .await
        .unwrap_err();

    assert!(matches!(error, MarketDataError::EmptyResult));
}

#[tokio::test]
async fn chart_recovers_on_a_later_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"chart": {"result": [], "error": null}})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_body(78)))
        .expect(1)
        .mount(&server)
        .await;

    let client = YahooFinanceClient::new(&fast_settings(&server.uri())).unwrap();
    let candles = client
        .get_chart("AAPL", ChartRange::OneDay, ChartInterval::FiveMinutes)
        .await
        .unwrap();

    assert_eq!(candles.len(), 78);
}

#[tokio::test]
async fn upstream_chart_error_payload_is_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/BAD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found"}
            }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let client = YahooFinanceClient::new(&fast_settings(&server.uri())).unwrap();
    let error = client
        .get_chart("BAD", ChartRange::OneDay, ChartInterval::FiveMinutes)
        .await
        .unwrap_err();

    assert!(error.is_not_found());
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v7/finance/quote"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(quote_body("AAPL"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let mut settings = fast_settings(&server.uri());
    settings.request_timeout = Duration::from_millis(50);
    let client = YahooFinanceClient::new(&settings).unwrap();
    let error = client.get_quote("AAPL").await.unwrap_err();

    assert!(matches!(error, MarketDataError::Timeout));
}

#[tokio::test]
async fn search_parses_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/finance/search"))
        .and(query_param("q", "apple"))
        .and(query_param("quotesCount", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quotes": [
                {"symbol": "AAPL", "exchange": "NMS", "shortname": "Apple Inc.", "quoteType": "EQUITY"},
                {"symbol": "APLE", "exchange": "NMS", "quoteType": "EQUITY"}
            ],
            "news": []
        })))
        .mount(&server)
        .await;

    let client = YahooFinanceClient::new(&fast_settings(&server.uri())).unwrap();
    let matches = client.search("apple").await.unwrap();

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].symbol, "AAPL");
    assert_eq!(matches[0].shortname.as_deref(), Some("Apple Inc."));
    assert!(matches[1].shortname.is_none());
}
