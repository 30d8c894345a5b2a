//! OHLCV bars and chart range policies.
//!
//! Upstream chart responses arrive as parallel arrays with nullable
//! entries. [`Candle::from_parts`] applies the validation rules: the close
//! is authoritative and must be a positive finite number, open/high/low
//! fall back to the close, volume falls back to zero. Bars failing
//! validation are dropped, never emitted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::hours;

/// One OHLCV bar for a time bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bucket start, epoch seconds.
    pub timestamp: i64,
    /// ISO-8601 rendering of `timestamp`.
    pub date: String,
    /// Opening price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Closing price. Authoritative for validation.
    pub close: f64,
    /// Traded volume in the bucket.
    pub volume: u64,
}

impl Candle {
    /// Build a validated bar from raw upstream parts.
    ///
    /// Returns `None` when the bar must be dropped: missing timestamp,
    /// timestamp outside the representable range, or a close that is not a
    /// positive finite number. Absent or non-finite open/high/low default
    /// to the close; absent or negative volume defaults to zero.
    #[must_use]
    pub fn from_parts(
        timestamp: Option<i64>,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
        volume: Option<u64>,
    ) -> Option<Self> {
        let timestamp = timestamp?;
        let date = DateTime::<Utc>::from_timestamp(timestamp, 0)?.to_rfc3339();

        let close = close.filter(|c| c.is_finite() && *c > 0.0)?;
        let or_close = |v: Option<f64>| v.filter(|p| p.is_finite()).unwrap_or(close);

        Some(Self {
            timestamp,
            date,
            open: or_close(open),
            high: or_close(high),
            low: or_close(low),
            close,
            volume: volume.unwrap_or(0),
        })
    }
}

/// Error for unrecognized range/interval strings.
#[derive(Debug, thiserror::Error)]
#[error("unsupported chart parameter: {0}")]
pub struct ParseChartParamError(String);

/// Supported chart lookback ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartRange {
    /// Intraday, today's session.
    OneDay,
    /// Trailing five days.
    FiveDays,
    /// Trailing month.
    OneMonth,
}

impl ChartRange {
    /// Wire form of the range.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
        }
    }

    /// Bar interval this range is served at, regardless of the interval
    /// the consumer asked for. Keeps bar density predictable and lets
    /// equivalent requests share a cache entry.
    #[must_use]
    pub const fn coerced_interval(self) -> ChartInterval {
        match self {
            Self::OneDay => ChartInterval::FiveMinutes,
            Self::FiveDays => ChartInterval::FifteenMinutes,
            Self::OneMonth => ChartInterval::OneDay,
        }
    }

    /// Bar count a full fetch of this range is expected to yield.
    #[must_use]
    pub const fn expected_bar_count(self) -> usize {
        match self {
            Self::OneDay => 78,
            Self::FiveDays => 130,
            Self::OneMonth => 20,
        }
    }

    /// Minimum usable bar count. A series below this is treated as an
    /// empty result: retried upstream and never cached.
    #[must_use]
    pub const fn min_bar_count(self) -> usize {
        self.expected_bar_count() / 2
    }

    /// Fetch window `(start, end)` for this range of `symbol`, ending at
    /// `now`.
    ///
    /// The intraday range starts at midnight of the current day in the
    /// symbol's exchange timezone, reaching one day further back before
    /// 09:00 local so pre-open requests still cover the previous session.
    #[must_use]
    pub fn period_window(
        self,
        symbol: &str,
        now: DateTime<Utc>,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = match self {
            Self::OneDay => {
                let local = now.with_timezone(&hours::exchange_tz(symbol));
                let midnight = local
                    .with_hour(0)
                    .and_then(|t| t.with_minute(0))
                    .and_then(|t| t.with_second(0))
                    .and_then(|t| t.with_nanosecond(0))
                    .unwrap_or(local);
                let start_local = if local.hour() < 9 {
                    midnight - Duration::days(1)
                } else {
                    midnight
                };
                start_local.with_timezone(&Utc)
            }
            Self::FiveDays => now - Duration::days(5),
            Self::OneMonth => now
                .checked_sub_months(Months::new(1))
                .unwrap_or(now - Duration::days(30)),
        };
        (start, now)
    }
}

impl FromStr for ChartRange {
    type Err = ParseChartParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Self::OneDay),
            "5d" => Ok(Self::FiveDays),
            "1mo" => Ok(Self::OneMonth),
            other => Err(ParseChartParamError(other.to_string())),
        }
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported bar intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartInterval {
    /// Five-minute bars.
    FiveMinutes,
    /// Fifteen-minute bars.
    FifteenMinutes,
    /// Daily bars.
    OneDay,
}

impl ChartInterval {
    /// Wire form of the interval.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneDay => "1d",
        }
    }
}

impl FromStr for ChartInterval {
    type Err = ParseChartParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" => Ok(Self::FiveMinutes),
            "15m" => Ok(Self::FifteenMinutes),
            "1d" => Ok(Self::OneDay),
            other => Err(ParseChartParamError(other.to_string())),
        }
    }
}

impl fmt::Display for ChartInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn valid_bar_passes_through() {
        let bar = Candle::from_parts(
            Some(1_717_400_000),
            Some(10.0),
            Some(11.0),
            Some(9.5),
            Some(10.5),
            Some(1000),
        )
        .unwrap();
        assert_eq!(bar.open, 10.0);
        assert_eq!(bar.close, 10.5);
        assert_eq!(bar.volume, 1000);
        assert!(bar.date.starts_with("2024-06-03"));
    }

    #[test]
    fn missing_timestamp_drops_bar() {
        assert!(Candle::from_parts(None, None, None, None, Some(10.0), None).is_none());
    }

    #[test]
    fn invalid_close_drops_bar() {
        let ts = Some(1_717_400_000);
        assert!(Candle::from_parts(ts, None, None, None, None, None).is_none());
        assert!(Candle::from_parts(ts, None, None, None, Some(0.0), None).is_none());
        assert!(Candle::from_parts(ts, None, None, None, Some(-3.0), None).is_none());
        assert!(Candle::from_parts(ts, None, None, None, Some(f64::NAN), None).is_none());
        assert!(Candle::from_parts(ts, None, None, None, Some(f64::INFINITY), None).is_none());
    }

    #[test]
    fn absent_ohl_and_volume_default() {
        let bar = Candle::from_parts(Some(1_717_400_000), None, Some(f64::NAN), None, Some(7.0), None)
            .unwrap();
        assert_eq!(bar.open, 7.0);
        assert_eq!(bar.high, 7.0);
        assert_eq!(bar.low, 7.0);
        assert_eq!(bar.volume, 0);
    }

    #[test]
    fn range_round_trips_wire_form() {
        for range in [ChartRange::OneDay, ChartRange::FiveDays, ChartRange::OneMonth] {
            assert_eq!(range.as_str().parse::<ChartRange>().unwrap(), range);
        }
        assert!("2y".parse::<ChartRange>().is_err());
    }

    #[test]
    fn interval_coercion_follows_range() {
        assert_eq!(
            ChartRange::OneDay.coerced_interval(),
            ChartInterval::FiveMinutes
        );
        assert_eq!(
            ChartRange::FiveDays.coerced_interval(),
            ChartInterval::FifteenMinutes
        );
        assert_eq!(ChartRange::OneMonth.coerced_interval(), ChartInterval::OneDay);
    }

    #[test]
    fn min_bar_counts() {
        assert_eq!(ChartRange::OneDay.min_bar_count(), 39);
        assert_eq!(ChartRange::FiveDays.min_bar_count(), 65);
        assert_eq!(ChartRange::OneMonth.min_bar_count(), 10);
    }

    #[test]
    fn intraday_window_starts_at_exchange_midnight() {
        // 14:30 New York, 2025-06-03 (EDT, UTC-4).
        let now = chrono_tz::America::New_York
            .with_ymd_and_hms(2025, 6, 3, 14, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        let (start, end) = ChartRange::OneDay.period_window("AAPL", now);
        assert_eq!(
            start,
            chrono_tz::America::New_York
                .with_ymd_and_hms(2025, 6, 3, 0, 0, 0)
                .unwrap()
                .with_timezone(&Utc)
        );
        assert_eq!(end, now);
    }

    #[test]
    fn intraday_window_reaches_back_before_nine_local() {
        let now = chrono_tz::America::New_York
            .with_ymd_and_hms(2025, 6, 3, 6, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let (start, _) = ChartRange::OneDay.period_window("AAPL", now);
        assert_eq!(
            start,
            chrono_tz::America::New_York
                .with_ymd_and_hms(2025, 6, 2, 0, 0, 0)
                .unwrap()
                .with_timezone(&Utc)
        );
    }

    #[test]
    fn korean_intraday_boundary_uses_seoul_time() {
        // 08:00 KST is 23:00 UTC the previous day; the boundary must see
        // a pre-open Korean morning, not the UTC evening hour.
        let now = chrono_tz::Asia::Seoul
            .with_ymd_and_hms(2025, 6, 3, 8, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let (start, _) = ChartRange::OneDay.period_window("005930.KS", now);
        assert_eq!(
            start,
            chrono_tz::Asia::Seoul
                .with_ymd_and_hms(2025, 6, 2, 0, 0, 0)
                .unwrap()
                .with_timezone(&Utc)
        );

        // Mid-session the window starts at Seoul midnight of the same day.
        let later = chrono_tz::Asia::Seoul
            .with_ymd_and_hms(2025, 6, 3, 10, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let (start, _) = ChartRange::OneDay.period_window("005930.KS", later);
        assert_eq!(
            start,
            chrono_tz::Asia::Seoul
                .with_ymd_and_hms(2025, 6, 3, 0, 0, 0)
                .unwrap()
                .with_timezone(&Utc)
        );
    }

    #[test]
    fn trailing_windows() {
        let now = Utc.with_ymd_and_hms(2025, 6, 3, 12, 0, 0).unwrap();
        let (start, _) = ChartRange::FiveDays.period_window("AAPL", now);
        assert_eq!(start, now - Duration::days(5));

        let (start, _) = ChartRange::OneMonth.period_window("AAPL", now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 5, 3, 12, 0, 0).unwrap());
    }
}
