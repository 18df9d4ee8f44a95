pub mod rapidapi;
pub mod yahoo;

use std::time::Duration;

use async_trait::async_trait;
use marketdesk_models::market::{NewsItem, OptionsChain, Quote, TimeSeries};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::error::MarketError;

pub use rapidapi::RapidApiNewsClient;
pub use yahoo::YahooClient;

const USER_AGENT: &str = concat!("marketdesk/", env!("CARGO_PKG_VERSION"));

/// Upstream source of quotes, price series and options chains. Mockable for testing.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn quote(&self, symbol: &str) -> Result<Quote, MarketError>;

    async fn time_series(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<TimeSeries, MarketError>;

    /// Chain for `expiration` (unix seconds), or the nearest expiration when `None`.
    async fn options_chain(
        &self,
        symbol: &str,
        expiration: Option<i64>,
    ) -> Result<OptionsChain, MarketError>;
}

/// Upstream source of market news.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// News for `ticker`, or general market news when `None`.
    async fn news(
        &self,
        ticker: Option<&str>,
        language: &str,
        limit: usize,
    ) -> Result<Vec<NewsItem>, MarketError>;
}

/// Build the shared reqwest client used by every upstream source.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, MarketError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| MarketError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Turn a non-2xx response into [`MarketError::Status`].
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, MarketError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(MarketError::Status {
        service,
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

/// Convert an upstream float price to a decimal rounded to 4 places.
pub(crate) fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(4))
        .unwrap_or_default()
}
