//! Exchange trading-hours calendar.
//!
//! One canonical market-open check shared by the streaming loop and any
//! consumer that wants to display market status. The check is a pure
//! function of `(symbol, instant)` so it can be driven by a fake clock in
//! tests.
//!
//! Windows are half-open: the opening minute is inside the window, the
//! closing minute is outside (15:30:00 KST and 16:00:00 ET count as
//! closed).

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use super::symbol;

/// Korean exchange trading window, minutes since local midnight.
const KRX_WINDOW: (u32, u32) = (9 * 60, 15 * 60 + 30);
/// US exchange trading window, minutes since local midnight.
const US_WINDOW: (u32, u32) = (9 * 60 + 30, 16 * 60);

/// Timezone of the symbol's home exchange.
#[must_use]
pub fn exchange_tz(symbol: &str) -> Tz {
    if symbol::is_korean(symbol) {
        chrono_tz::Asia::Seoul
    } else {
        chrono_tz::America::New_York
    }
}

/// Check whether the home exchange of `symbol` is open at `instant`.
///
/// `.KS`-suffixed symbols use the Korean exchange window (09:00-15:30
/// Asia/Seoul); all other symbols use the US window (09:30-16:00
/// America/New_York). Weekends are always closed, evaluated against the
/// exchange's local weekday.
#[must_use]
pub fn is_market_open(symbol: &str, instant: DateTime<Utc>) -> bool {
    let window = if symbol::is_korean(symbol) {
        KRX_WINDOW
    } else {
        US_WINDOW
    };

    is_open_in(exchange_tz(symbol), window, instant)
}

fn is_open_in(tz: Tz, (start, end): (u32, u32), instant: DateTime<Utc>) -> bool {
    let local = instant.with_timezone(&tz);

    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let minute_of_day = local.hour() * 60 + local.minute();
    minute_of_day >= start && minute_of_day < end
}
