//! Shared validation for query parameters accepted by the market-data routes.

use thiserror::Error;

/// Ranges accepted for `period`.
pub const VALID_PERIODS: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

/// Bar sizes accepted for `interval`.
pub const VALID_INTERVALS: &[&str] = &[
    "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
];

pub const DEFAULT_PERIOD: &str = "1mo";
pub const DEFAULT_INTERVAL: &str = "1d";

const MAX_TICKER_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("Ticker is required")]
    Missing,
    #[error("Invalid ticker symbol: {0}")]
    Invalid(String),
}

/// Trim and upper-case a ticker. Blank input counts as missing.
pub fn normalize_ticker(raw: Option<&str>) -> Result<String, TickerError> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(TickerError::Missing);
    }

    let ticker = trimmed.to_ascii_uppercase();
    let valid_chars = ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'));
    if ticker.len() > MAX_TICKER_LEN || !valid_chars {
        return Err(TickerError::Invalid(trimmed.to_string()));
    }

    Ok(ticker)
}

pub fn is_valid_period(period: &str) -> bool {
    VALID_PERIODS.contains(&period)
}

pub fn is_valid_interval(interval: &str) -> bool {
    VALID_INTERVALS.contains(&interval)
}

/// Approximate number of calendar days covered by a period.
pub fn period_days(period: &str) -> u32 {
    match period {
        "1d" => 1,
        "5d" => 5,
        "1mo" => 30,
        "3mo" => 91,
        "6mo" => 182,
        "1y" | "ytd" => 365,
        "2y" => 730,
        "5y" => 1826,
        "10y" | "max" => 3652,
        _ => 30,
    }
}

/// Approximate bar length of an interval in minutes.
pub fn interval_minutes(interval: &str) -> u32 {
    match interval {
        "1m" => 1,
        "2m" => 2,
        "5m" => 5,
        "15m" => 15,
        "30m" => 30,
        "60m" | "1h" => 60,
        "90m" => 90,
        "1d" => 1_440,
        "5d" => 7_200,
        "1wk" => 10_080,
        "1mo" => 43_200,
        "3mo" => 129_600,
        _ => 1_440,
    }
}
