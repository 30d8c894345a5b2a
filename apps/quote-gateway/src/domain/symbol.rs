//! Symbol normalization.
//!
//! Tickers arrive from consumers in three shapes: bare six-digit Korean
//! codes (`005930`), exchange-qualified symbols (`005930.KS`, `035720.KQ`)
//! and plain US tickers (`AAPL`). Upstream expects Korean symbols to carry
//! their exchange suffix, so bare numeric codes default to the KOSPI
//! suffix. Everything else passes through unchanged.

/// Suffix for KOSPI-listed symbols.
pub const KOSPI_SUFFIX: &str = ".KS";

/// Normalize a raw ticker to its exchange-qualified form.
///
/// - a bare 6-digit numeric code is assumed Korean and gets `.KS` appended;
/// - a symbol already ending in a `.XX` two-letter exchange suffix is
///   returned unchanged;
/// - anything else is assumed US-listed and returned unchanged.
#[must_use]
pub fn normalize(symbol: &str) -> String {
    let symbol = symbol.trim();

    if has_exchange_suffix(symbol) {
        return symbol.to_string();
    }

    if symbol.len() == 6 && symbol.bytes().all(|b| b.is_ascii_digit()) {
        return format!("{symbol}{KOSPI_SUFFIX}");
    }

    symbol.to_string()
}

/// Check whether a symbol already carries a `.XX` exchange suffix.
#[must_use]
pub fn has_exchange_suffix(symbol: &str) -> bool {
    let bytes = symbol.as_bytes();
    bytes.len() > 3
        && bytes[bytes.len() - 3] == b'.'
        && bytes[bytes.len() - 2].is_ascii_uppercase()
        && bytes[bytes.len() - 1].is_ascii_uppercase()
}

/// Check whether a symbol trades on the Korean exchange.
#[must_use]
pub fn is_korean(symbol: &str) -> bool {
    symbol.ends_with(KOSPI_SUFFIX)
}
