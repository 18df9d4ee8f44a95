use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use marketdesk_market::indicators::technical_insights;
use marketdesk_models::market::{
    Candle, DataSource, NewsItem, OptionsChain, Quote, TechnicalInsights,
};
use marketdesk_models::params::{
    is_valid_interval, is_valid_period, normalize_ticker, TickerError, DEFAULT_INTERVAL,
    DEFAULT_PERIOD,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub ticker: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    /// `null` for general market news.
    pub ticker: Option<String>,
    pub language: String,
    pub news: Vec<NewsItem>,
    pub source: DataSource,
}

#[derive(Debug, Deserialize)]
pub struct TimeSeriesQuery {
    pub ticker: Option<String>,
    pub period: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TimeSeriesResponse {
    pub ticker: String,
    pub period: String,
    pub interval: String,
    pub points: Vec<Candle>,
    pub insights: Option<TechnicalInsights>,
    pub source: DataSource,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub ticker: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub ticker: String,
    pub quote: Quote,
    pub source: DataSource,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct OptionsQuery {
    pub ticker: Option<String>,
    /// Unix seconds of the wanted expiration; nearest when absent.
    pub expiration: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub ticker: String,
    #[serde(flatten)]
    pub chain: OptionsChain,
    pub source: DataSource,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/news -- ticker or general market news
pub async fn get_news(
    State(state): State<AppState>,
    query: Result<Query<NewsQuery>, QueryRejection>,
) -> Result<Json<NewsResponse>, ApiError> {
    let Query(q) = query?;

    let ticker = match normalize_ticker(q.ticker.as_deref()) {
        Ok(t) => Some(t),
        Err(TickerError::Missing) => None,
        Err(e) => return Err(e.into()),
    };
    let language = q
        .language
        .map(|l| l.trim().to_ascii_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let sourced = state.news.news(ticker.as_deref(), &language).await;
    debug!(?ticker, count = sourced.data.len(), source = sourced.source.as_str(), "Served news");

    Ok(Json(NewsResponse {
        ticker,
        language,
        news: sourced.data,
        source: sourced.source,
    }))
}

/// GET /api/timeseries -- price history plus technical insights
pub async fn get_timeseries(
    State(state): State<AppState>,
    query: Result<Query<TimeSeriesQuery>, QueryRejection>,
) -> Result<Json<TimeSeriesResponse>, ApiError> {
    let Query(q) = query?;

    let ticker = normalize_ticker(q.ticker.as_deref())?;
    let period = non_blank(q.period).unwrap_or_else(|| DEFAULT_PERIOD.to_string());
    if !is_valid_period(&period) {
        return Err(ApiError::bad_request(format!("Invalid period: {period}")));
    }
    let interval = non_blank(q.interval).unwrap_or_else(|| DEFAULT_INTERVAL.to_string());
    if !is_valid_interval(&interval) {
        return Err(ApiError::bad_request(format!("Invalid interval: {interval}")));
    }

    let sourced = state.market.time_series(&ticker, &period, &interval).await;
    let insights = technical_insights(&sourced.data);
    let series = sourced.data;

    Ok(Json(TimeSeriesResponse {
        ticker,
        period: series.period,
        interval: series.interval,
        points: series.points,
        insights,
        source: sourced.source,
        timestamp: Utc::now(),
    }))
}

/// GET /api/quote -- latest quote
pub async fn get_quote(
    State(state): State<AppState>,
    query: Result<Query<QuoteQuery>, QueryRejection>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let Query(q) = query?;
    let ticker = normalize_ticker(q.ticker.as_deref())?;

    let sourced = state.market.quote(&ticker).await;
    Ok(Json(QuoteResponse {
        ticker,
        quote: sourced.data,
        source: sourced.source,
        timestamp: Utc::now(),
    }))
}

/// GET /api/options -- options chain for one expiration
pub async fn get_options(
    State(state): State<AppState>,
    query: Result<Query<OptionsQuery>, QueryRejection>,
) -> Result<Json<OptionsResponse>, ApiError> {
    let Query(q) = query?;
    let ticker = normalize_ticker(q.ticker.as_deref())?;

    let sourced = state.market.options_chain(&ticker, q.expiration).await;
    Ok(Json(OptionsResponse {
        ticker,
        chain: sourced.data,
        source: sourced.source,
        timestamp: Utc::now(),
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
