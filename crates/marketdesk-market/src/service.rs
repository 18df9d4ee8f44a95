use std::sync::Arc;

use chrono::Utc;
use marketdesk_models::market::{DataSource, NewsItem, OptionsChain, Quote, TimeSeries};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::MarketError;
use crate::memory::MemoryCache;
use crate::mock;
use crate::sources::{MarketDataProvider, NewsProvider};

/// A value tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> Sourced<T> {
    pub fn api(data: T) -> Self {
        Self {
            data,
            source: DataSource::Api,
        }
    }

    pub fn mock(data: T) -> Self {
        Self {
            data,
            source: DataSource::Mock,
        }
    }

    pub fn is_mock(&self) -> bool {
        self.source == DataSource::Mock
    }
}

/// Market data with mock fallback.
///
/// Every call succeeds: a live upstream answer (fresh or from the hot cache)
/// is tagged `api`, anything else is replaced by the mock generator and
/// tagged `mock`.
pub struct MarketData {
    provider: Arc<dyn MarketDataProvider>,
    cache: Option<MemoryCache>,
}

impl MarketData {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: Option<MemoryCache>) -> Self {
        Self { provider, cache }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn quote(&self, symbol: &str) -> Sourced<Quote> {
        let key = format!("quote:{symbol}");
        if let Some(hit) = self.cached(&key).await {
            return Sourced::api(hit);
        }

        let result = self.provider.quote(symbol).await;
        self.settle(key, result, || mock::mock_quote(symbol)).await
    }

    pub async fn time_series(&self, symbol: &str, period: &str, interval: &str) -> Sourced<TimeSeries> {
        let key = format!("series:{symbol}:{period}:{interval}");
        if let Some(hit) = self.cached(&key).await {
            return Sourced::api(hit);
        }

        let result = self.provider.time_series(symbol, period, interval).await;
        self.settle(key, result, || {
            mock::mock_time_series(symbol, period, interval, Utc::now())
        })
        .await
    }

    pub async fn options_chain(&self, symbol: &str, expiration: Option<i64>) -> Sourced<OptionsChain> {
        let key = match expiration {
            Some(e) => format!("options:{symbol}:{e}"),
            None => format!("options:{symbol}:nearest"),
        };
        if let Some(hit) = self.cached(&key).await {
            return Sourced::api(hit);
        }

        let result = self.provider.options_chain(symbol, expiration).await;
        self.settle(key, result, || {
            mock::mock_options_chain(symbol, expiration, Utc::now())
        })
        .await
    }

    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let hit = self.cache.as_ref()?.get(key).await;
        if hit.is_some() {
            debug!(key, "Hot cache hit");
        }
        hit
    }

    async fn settle<T: Serialize>(
        &self,
        key: String,
        result: Result<T, MarketError>,
        fallback: impl FnOnce() -> T,
    ) -> Sourced<T> {
        match result {
            Ok(data) => {
                if let Some(cache) = &self.cache {
                    cache.insert(key, &data).await;
                }
                Sourced::api(data)
            }
            Err(e) => {
                warn!(
                    key = %key,
                    provider = self.provider.name(),
                    error = %e,
                    "Upstream fetch failed, using mock data"
                );
                Sourced::mock(fallback())
            }
        }
    }
}

/// Market news with mock fallback. Without a provider (no API key) every
/// call is served from the mock generator.
pub struct NewsService {
    provider: Option<Arc<dyn NewsProvider>>,
    limit: usize,
}

impl NewsService {
    pub fn new(provider: Option<Arc<dyn NewsProvider>>, limit: usize) -> Self {
        Self { provider, limit }
    }

    pub fn is_live(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn news(&self, ticker: Option<&str>, language: &str) -> Sourced<Vec<NewsItem>> {
        let Some(provider) = &self.provider else {
            debug!(?ticker, "No news provider configured, using mock news");
            return Sourced::mock(mock::mock_news(ticker, self.limit, Utc::now()));
        };

        match provider.news(ticker, language, self.limit).await {
            Ok(items) => Sourced::api(items),
            Err(e) => {
                warn!(
                    ?ticker,
                    provider = provider.name(),
                    error = %e,
                    "News fetch failed, using mock news"
                );
                Sourced::mock(mock::mock_news(ticker, self.limit, Utc::now()))
            }
        }
    }
}
