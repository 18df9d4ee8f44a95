use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marketdesk_models::market::{Candle, OptionContract, OptionsChain, Quote, TimeSeries};
use serde::Deserialize;
use tracing::debug;

use super::{check_status, to_decimal, MarketDataProvider};
use crate::error::MarketError;

/// Yahoo Finance chart and options client.
pub struct YahooClient {
    http: reqwest::Client,
    chart_url: String,
    options_url: String,
}

impl YahooClient {
    pub fn new(http: reqwest::Client, chart_url: &str, options_url: &str) -> Self {
        Self {
            http,
            chart_url: chart_url.trim_end_matches('/').to_string(),
            options_url: options_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<ChartResult, MarketError> {
        let url = format!("{}/{}", self.chart_url, symbol);
        debug!(symbol, range, interval, "Fetching Yahoo chart");

        let response = self
            .http
            .get(&url)
            .query(&[("range", range), ("interval", interval)])
            .send()
            .await?;
        let envelope: ChartEnvelope = check_status("yahoo", response).await?.json().await?;

        if let Some(err) = envelope.chart.error {
            return Err(MarketError::Malformed(format!(
                "{symbol}: {}",
                err.description.unwrap_or(err.code)
            )));
        }

        envelope
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| MarketError::NoData(symbol.to_string()))
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn quote(&self, symbol: &str) -> Result<Quote, MarketError> {
        let chart = self.fetch_chart(symbol, "5d", "1d").await?;
        quote_from_chart(symbol, &chart)
    }

    async fn time_series(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<TimeSeries, MarketError> {
        let chart = self.fetch_chart(symbol, period, interval).await?;
        let points = candles_from_chart(&chart);
        if points.is_empty() {
            return Err(MarketError::NoData(symbol.to_string()));
        }

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
        let url = format!("{}/{}", self.options_url, symbol);
        let mut request = self.http.get(&url);
        if let Some(date) = expiration {
            request = request.query(&[("date", date)]);
        }

        let response = request.send().await?;
        let envelope: OptionsEnvelope = check_status("yahoo", response).await?.json().await?;
        let result = envelope
            .option_chain
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| MarketError::NoData(symbol.to_string()))?;

        chain_from_result(symbol, result)
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, MarketError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| MarketError::Malformed(format!("timestamp out of range: {secs}")))
}

/// Build a quote from chart metadata, using the last bar for fields meta omits.
fn quote_from_chart(symbol: &str, chart: &ChartResult) -> Result<Quote, MarketError> {
    let meta = &chart.meta;
    let candles = candles_from_chart(chart);
    let last = candles.last();

    let price = meta
        .regular_market_price
        .or_else(|| last.map(|c| c.close))
        .ok_or_else(|| MarketError::NoData(symbol.to_string()))?;
    let previous_close = meta
        .previous_close
        .or(meta.chart_previous_close)
        .or_else(|| {
            candles
                .len()
                .checked_sub(2)
                .and_then(|i| candles.get(i))
                .map(|c| c.close)
        })
        .unwrap_or(price);

    let change = price - previous_close;
    let change_percent = if previous_close != 0.0 {
        change / previous_close * 100.0
    } else {
        0.0
    };

    let market_time = match meta.regular_market_time {
        Some(t) => timestamp(t)?,
        None => last.map(|c| c.timestamp).unwrap_or_else(Utc::now),
    };

    Ok(Quote {
        symbol: meta.symbol.clone().unwrap_or_else(|| symbol.to_string()),
        price: to_decimal(price),
        change: to_decimal(change),
        change_percent: to_decimal(change_percent),
        previous_close: to_decimal(previous_close),
        open: to_decimal(last.map(|c| c.open).unwrap_or(price)),
        day_high: to_decimal(
            meta.regular_market_day_high
                .or_else(|| last.map(|c| c.high))
                .unwrap_or(price),
        ),
        day_low: to_decimal(
            meta.regular_market_day_low
                .or_else(|| last.map(|c| c.low))
                .unwrap_or(price),
        ),
        volume: meta
            .regular_market_volume
            .or_else(|| last.map(|c| c.volume))
            .unwrap_or(0),
        currency: meta.currency.clone().unwrap_or_else(|| "USD".to_string()),
        exchange: meta.exchange_name.clone(),
        market_time,
    })
}

/// Zip the chart's parallel arrays into candles, skipping bars with null prices.
fn candles_from_chart(chart: &ChartResult) -> Vec<Candle> {
    let Some(quote) = chart.indicators.quote.first() else {
        return Vec::new();
    };

    chart
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let at = |series: &[Option<f64>]| series.get(i).copied().flatten();
            Some(Candle {
                timestamp: DateTime::from_timestamp(ts, 0)?,
                open: at(&quote.open)?,
                high: at(&quote.high)?,
                low: at(&quote.low)?,
                close: at(&quote.close)?,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            })
        })
        .collect()
}

fn chain_from_result(symbol: &str, result: OptionsResult) -> Result<OptionsChain, MarketError> {
    let underlying = result
        .quote
        .and_then(|q| q.regular_market_price)
        .ok_or_else(|| MarketError::Malformed(format!("{symbol}: missing underlying price")))?;
    let block = result
        .options
        .into_iter()
        .next()
        .ok_or_else(|| MarketError::NoData(symbol.to_string()))?;

    let expirations = result
        .expiration_dates
        .into_iter()
        .map(timestamp)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OptionsChain {
        expiration: timestamp(block.expiration_date)?,
        expirations,
        underlying_price: to_decimal(underlying),
        calls: block.calls.into_iter().map(contract_from_raw).collect(),
        puts: block.puts.into_iter().map(contract_from_raw).collect(),
    })
}

fn contract_from_raw(raw: RawContract) -> OptionContract {
    OptionContract {
        contract_symbol: raw.contract_symbol,
        strike: to_decimal(raw.strike),
        last_price: to_decimal(raw.last_price.unwrap_or(0.0)),
        bid: to_decimal(raw.bid.unwrap_or(0.0)),
        ask: to_decimal(raw.ask.unwrap_or(0.0)),
        volume: raw.volume.unwrap_or(0),
        open_interest: raw.open_interest.unwrap_or(0),
        implied_volatility: raw.implied_volatility.unwrap_or(0.0),
        in_the_money: raw.in_the_money.unwrap_or(false),
    }
}

// Upstream payloads

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: Option<String>,
    currency: Option<String>,
    exchange_name: Option<String>,
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_time: Option<i64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChartQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct OptionsEnvelope {
    #[serde(rename = "optionChain")]
    option_chain: OptionsBody,
}

#[derive(Debug, Deserialize)]
struct OptionsBody {
    result: Option<Vec<OptionsResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsResult {
    #[serde(default)]
    expiration_dates: Vec<i64>,
    quote: Option<OptionsQuote>,
    #[serde(default)]
    options: Vec<OptionsBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsQuote {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsBlock {
    expiration_date: i64,
    #[serde(default)]
    calls: Vec<RawContract>,
    #[serde(default)]
    puts: Vec<RawContract>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContract {
    contract_symbol: String,
    strike: f64,
    last_price: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
    volume: Option<u64>,
    open_interest: Option<u64>,
    implied_volatility: Option<f64>,
    in_the_money: Option<bool>,
}
