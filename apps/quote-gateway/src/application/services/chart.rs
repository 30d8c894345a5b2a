//! Chart retrieval with cache-first lookup.

use std::sync::Arc;

use crate::application::ports::{MarketDataError, MarketDataPort};
use crate::domain::candle::{Candle, ChartRange};
use crate::infrastructure::cache::{ChartCache, ChartKey};

/// Serves candle series, consulting the cache before the provider.
///
/// The requested interval is coerced from the range before keying, so
/// equivalent requests share one cache entry. A fetched series below the
/// range's minimum bar count is surfaced as an empty result and never
/// cached, which forces a fresh fetch on the next request.
pub struct ChartService {
    provider: Arc<dyn MarketDataPort>,
    cache: ChartCache,
}

impl ChartService {
    /// Create a service over a provider and a cache.
    #[must_use]
    pub fn new(provider: Arc<dyn MarketDataPort>, cache: ChartCache) -> Self {
        Self { provider, cache }
    }

    /// Fetch the candle series for `(symbol, range)`.
    ///
    /// Concurrent identical requests are not coalesced; the worst case is
    /// a redundant upstream fetch, not incorrect data.
    pub async fn get_chart(
        &self,
        symbol: &str,
        range: ChartRange,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let interval = range.coerced_interval();
        let key = ChartKey::new(symbol, range, interval);

        if let Some(candles) = self.cache.lookup(&key) {
            tracing::debug!(symbol, range = %range, bars = candles.len(), "chart cache hit");
            return Ok(candles);
        }

        let candles = self.provider.get_chart(symbol, range, interval).await?;

        if candles.len() < range.min_bar_count() {
            tracing::warn!(
                symbol,
                range = %range,
                bars = candles.len(),
                required = range.min_bar_count(),
                "sparse chart response, not caching"
            );
            return Err(MarketDataError::EmptyResult);
        }

        self.cache.store(key, candles.clone());
        tracing::debug!(symbol, range = %range, bars = candles.len(), "chart cached");
        Ok(candles)
    }
}
