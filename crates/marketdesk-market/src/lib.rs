pub mod error;
pub mod indicators;
pub mod memory;
pub mod mock;
pub mod service;
pub mod sources;

pub mod test_support;

use std::sync::Arc;
use std::time::Duration;

use marketdesk_models::config::{CacheConfig, Credentials, UpstreamConfig};

pub use error::MarketError;
pub use memory::MemoryCache;
pub use service::{MarketData, NewsService, Sourced};
pub use sources::{MarketDataProvider, NewsProvider, RapidApiNewsClient, YahooClient};

/// Build the market-data service backed by Yahoo Finance.
pub fn build_market_data(
    upstream: &UpstreamConfig,
    cache: &CacheConfig,
    http: reqwest::Client,
) -> MarketData {
    let provider = YahooClient::new(http, &upstream.yahoo_chart_url, &upstream.yahoo_options_url);
    let memory = cache
        .enabled
        .then(|| MemoryCache::new(cache.max_capacity, Duration::from_secs(cache.ttl_seconds)));
    MarketData::new(Arc::new(provider), memory)
}

/// Build the news service. Without `RAPIDAPI_KEY` it serves mock news only.
pub fn build_news(
    upstream: &UpstreamConfig,
    credentials: &Credentials,
    http: reqwest::Client,
) -> NewsService {
    let provider = credentials.rapidapi_key.clone().map(|key| {
        Arc::new(RapidApiNewsClient::new(
            http,
            &upstream.rapidapi_base(),
            &upstream.rapidapi_host,
            key,
        )) as Arc<dyn NewsProvider>
    });
    NewsService::new(provider, upstream.news_limit)
}
