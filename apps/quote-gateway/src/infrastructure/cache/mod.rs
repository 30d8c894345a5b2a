//! Time-bounded chart response cache.
//!
//! Memoizes formatted candle series keyed by `(symbol, range, interval)`.
//! An entry serves reads only while younger than the TTL; stale entries
//! behave as misses and are superseded by the next successful store rather
//! than deleted eagerly. The clock is injected so expiry is deterministic
//! under test.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::domain::candle::{Candle, ChartInterval, ChartRange};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall-clock [`Clock`] used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cache key: one distinct chart request shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChartKey {
    /// Exchange-qualified ticker.
    pub symbol: String,
    /// Lookback range.
    pub range: ChartRange,
    /// Bar interval.
    pub interval: ChartInterval,
}

impl ChartKey {
    /// Build a key.
    #[must_use]
    pub fn new(symbol: &str, range: ChartRange, interval: ChartInterval) -> Self {
        Self {
            symbol: symbol.to_string(),
            range,
            interval,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    fetched_at: Instant,
    candles: Vec<Candle>,
}

/// TTL-bounded memoization of chart responses.
///
/// Interior locking keeps `lookup`/`store` usable behind a shared
/// reference; the lock is never held across an await point.
pub struct ChartCache {
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<ChartKey, CacheEntry>>,
}

impl ChartCache {
    /// Create a cache with the given TTL and capacity (0 = unbounded).
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            capacity,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a fresh entry. Entries older than the TTL are misses.
    #[must_use]
    pub fn lookup(&self, key: &ChartKey) -> Option<Vec<Candle>> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        if self.clock.now().duration_since(entry.fetched_at) < self.ttl {
            Some(entry.candles.clone())
        } else {
            None
        }
    }

    /// Store a candle series, stamping it with the current instant.
    ///
    /// When the cache is at capacity and the key is new, the stalest entry
    /// is evicted first.
    pub fn store(&self, key: ChartKey, candles: Vec<Candle>) {
        let mut entries = self.entries.lock();

        if self.capacity > 0 && entries.len() >= self.capacity && !entries.contains_key(&key) {
            let stalest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.fetched_at)
                .map(|(k, _)| k.clone());
            if let Some(stalest) = stalest {
                entries.remove(&stalest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                fetched_at: self.clock.now(),
                candles,
            },
        );
    }

    /// Number of resident entries, fresh or stale.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for ChartCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartCache")
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}
