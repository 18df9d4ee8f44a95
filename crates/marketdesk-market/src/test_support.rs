//! Canned providers for tests in this and downstream crates.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use marketdesk_models::market::{Candle, NewsItem, OptionsChain, Quote, TimeSeries};
use rust_decimal::Decimal;

use crate::error::MarketError;
use crate::mock;
use crate::sources::{MarketDataProvider, NewsProvider};

/// A provider whose every call fails, as if the upstream were down.
pub struct FailingProvider;

#[async_trait]
impl MarketDataProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        Err(MarketError::NoData(symbol.to_string()))
    }

    async fn time_series(
        &self,
        symbol: &str,
        _period: &str,
        _interval: &str,
    ) -> Result<TimeSeries, MarketError> {
        Err(MarketError::NoData(symbol.to_string()))
    }

    async fn options_chain(
        &self,
        symbol: &str,
        _expiration: Option<i64>,
    ) -> Result<OptionsChain, MarketError> {
        Err(MarketError::NoData(symbol.to_string()))
    }
}

#[async_trait]
impl NewsProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn news(
        &self,
        ticker: Option<&str>,
        _language: &str,
        _limit: usize,
    ) -> Result<Vec<NewsItem>, MarketError> {
        Err(MarketError::NoData(ticker.unwrap_or("market").to_string()))
    }
}

/// A provider returning fixed live-looking data and counting calls.
#[derive(Default)]
pub struct FixedProvider {
    pub calls: AtomicUsize,
}

impl FixedProvider {
    pub const PRICE: i64 = 100;

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MarketDataProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        self.tick();
        let price = Decimal::from(Self::PRICE);
        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change: Decimal::ONE,
            change_percent: Decimal::ONE,
            previous_close: price - Decimal::ONE,
            open: price,
            day_high: price,
            day_low: price,
            volume: 1_000,
            currency: "USD".to_string(),
            exchange: Some("TEST".to_string()),
            market_time: Utc::now(),
        })
    }

    async fn time_series(
        &self,
        _symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<TimeSeries, MarketError> {
        self.tick();
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        let points = (0..60)
            .map(|i| {
                let close = Self::PRICE as f64 + f64::from(i) * 0.5;
                Candle {
                    timestamp: start + Duration::days(i64::from(i)),
                    open: close - 0.25,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 10_000,
                }
            })
            .collect();

        Ok(TimeSeries {
            period: period.to_string(),
            interval: interval.to_string(),
            points,
        })
    }

    async fn options_chain(
        &self,
        symbol: &str,
        expiration: Option<i64>,
    ) -> Result<OptionsChain, MarketError> {
        self.tick();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        Ok(mock::mock_options_chain(symbol, expiration, now))
    }
}

/// A news provider returning a single fixed article.
pub struct FixedNewsProvider;

#[async_trait]
impl NewsProvider for FixedNewsProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn news(
        &self,
        ticker: Option<&str>,
        _language: &str,
        _limit: usize,
    ) -> Result<Vec<NewsItem>, MarketError> {
        Ok(vec![NewsItem {
            title: "Fixed headline".to_string(),
            summary: "Fixed summary".to_string(),
            url: "https://example.com/fixed".to_string(),
            publisher: "Test Wire".to_string(),
            published_at: Utc::now(),
            tickers: ticker.map(|t| vec![t.to_string()]).unwrap_or_default(),
        }])
    }
}
