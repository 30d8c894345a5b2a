//! Domain layer - Market data types and pure calendar/validation logic.

/// OHLCV bars, chart ranges and bar-count policies.
pub mod candle;
/// Exchange trading-hours calendar.
pub mod hours;
/// Quote snapshots and market status.
pub mod quote;
/// Symbol normalization rules.
pub mod symbol;
