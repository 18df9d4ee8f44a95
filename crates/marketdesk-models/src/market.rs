use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a piece of market data came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Live upstream API (or the hot cache of a live response).
    Api,
    /// Synthetic data substituted by a mock generator.
    Mock,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Api => "api",
            DataSource::Mock => "mock",
        }
    }
}

/// Latest quote for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    pub previous_close: Decimal,
    pub open: Decimal,
    pub day_high: Decimal,
    pub day_low: Decimal,
    pub volume: u64,
    pub currency: String,
    pub exchange: Option<String>,
    pub market_time: DateTime<Utc>,
}

/// One OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Price history for a symbol over a period at a fixed interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSeries {
    pub period: String,
    pub interval: String,
    /// Bars in ascending timestamp order.
    pub points: Vec<Candle>,
}

impl TimeSeries {
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|c| c.close).collect()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.points.last()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    pub contract_symbol: String,
    pub strike: Decimal,
    pub last_price: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub volume: u64,
    pub open_interest: u64,
    /// Implied volatility as a fraction (0.25 = 25%).
    pub implied_volatility: f64,
    pub in_the_money: bool,
}

/// Calls and puts for a single expiration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionsChain {
    /// Expiration shown in this chain.
    pub expiration: DateTime<Utc>,
    /// All expirations the underlying lists.
    pub expirations: Vec<DateTime<Utc>>,
    pub underlying_price: Decimal,
    pub calls: Vec<OptionContract>,
    pub puts: Vec<OptionContract>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub url: String,
    pub publisher: String,
    pub published_at: DateTime<Utc>,
    pub tickers: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Position of the last close within the bands (0 = lower, 1 = upper).
    pub percent_b: f64,
}

/// Indicator summary derived from a [`TimeSeries`].
///
/// Indicators that need more bars than the series holds are `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalInsights {
    pub last_close: f64,
    pub period_change_percent: f64,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub ema12: Option<f64>,
    pub ema26: Option<f64>,
    pub macd: Option<MacdValue>,
    pub rsi14: Option<f64>,
    pub bollinger: Option<BollingerBands>,
    /// Annualized volatility of close-to-close returns.
    pub volatility: Option<f64>,
    pub support: f64,
    pub resistance: f64,
    pub trend: Trend,
    pub signals: Vec<String>,
}
