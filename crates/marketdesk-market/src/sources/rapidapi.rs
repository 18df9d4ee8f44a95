use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marketdesk_models::market::NewsItem;
use serde::Deserialize;
use tracing::debug;

use super::{check_status, NewsProvider};
use crate::error::MarketError;

/// Market news from a RapidAPI-hosted Yahoo Finance mirror.
pub struct RapidApiNewsClient {
    http: reqwest::Client,
    base_url: String,
    host: String,
    api_key: String,
}

impl RapidApiNewsClient {
    pub fn new(http: reqwest::Client, base_url: &str, host: &str, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            host: host.to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl NewsProvider for RapidApiNewsClient {
    fn name(&self) -> &str {
        "rapidapi"
    }

    async fn news(
        &self,
        ticker: Option<&str>,
        language: &str,
        limit: usize,
    ) -> Result<Vec<NewsItem>, MarketError> {
        let url = format!("{}/api/v1/markets/news", self.base_url);
        let mut query = vec![("language", language)];
        if let Some(t) = ticker {
            query.push(("ticker", t));
        }
        debug!(?ticker, language, "Fetching RapidAPI news");

        let response = self
            .http
            .get(&url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .query(&query)
            .send()
            .await?;
        let envelope: NewsEnvelope = check_status("rapidapi", response).await?.json().await?;

        let items: Vec<NewsItem> = envelope
            .body
            .into_iter()
            .filter_map(|raw| news_from_raw(raw, ticker))
            .take(limit)
            .collect();

        if items.is_empty() {
            return Err(MarketError::NoData(
                ticker.unwrap_or("market news").to_string(),
            ));
        }
        Ok(items)
    }
}

/// Map one upstream article. Articles without a title or link are dropped.
fn news_from_raw(raw: RawArticle, ticker: Option<&str>) -> Option<NewsItem> {
    let title = raw.title.filter(|t| !t.trim().is_empty())?;
    let url = raw.link.or(raw.url)?;

    let published_at = [raw.pub_date, raw.published_at, raw.time]
        .into_iter()
        .flatten()
        .find_map(|d| parse_published(&d))
        .unwrap_or_else(Utc::now);

    let mut tickers: Vec<String> = raw
        .tickers
        .into_iter()
        .map(|t| t.trim_start_matches('$').to_ascii_uppercase())
        .collect();
    if tickers.is_empty() {
        tickers.extend(ticker.map(str::to_string));
    }

    Some(NewsItem {
        title,
        summary: raw
            .description
            .or(raw.summary)
            .or(raw.text)
            .unwrap_or_default(),
        url,
        publisher: raw
            .source
            .or(raw.publisher)
            .unwrap_or_else(|| "Unknown".to_string()),
        published_at,
        tickers,
    })
}

/// Accepts RFC 2822 (`Mon, 16 Oct 2023 19:05:00 +0000`) and RFC 3339 dates.
fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
struct NewsEnvelope {
    #[serde(default)]
    body: Vec<RawArticle>,
}

/// Feeds differ in field names and some send several spellings at once, so
/// each spelling is its own field and the first present one wins.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    title: Option<String>,
    link: Option<String>,
    url: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    text: Option<String>,
    source: Option<String>,
    publisher: Option<String>,
    pub_date: Option<String>,
    published_at: Option<String>,
    time: Option<String>,
    #[serde(default)]
    tickers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn maps_v1_article() {
        let raw: RawArticle = serde_json::from_value(serde_json::json!({
            "title": "Apple unveils new chips",
            "link": "https://example.com/a",
            "description": "Details inside",
            "source": "Reuters",
            "pubDate": "Mon, 16 Oct 2023 19:05:00 +0000"
        }))
        .unwrap();

        let item = news_from_raw(raw, Some("AAPL")).unwrap();
        assert_eq!(item.publisher, "Reuters");
        assert_eq!(item.tickers, vec!["AAPL"]);
        assert_eq!(
            item.published_at,
            Utc.with_ymd_and_hms(2023, 10, 16, 19, 5, 0).unwrap()
        );
    }

    #[test]
    fn maps_aliased_fields_and_strips_dollar_tickers() {
        let raw: RawArticle = serde_json::from_value(serde_json::json!({
            "title": "Chipmakers rally",
            "url": "https://example.com/b",
            "text": "Semis up",
            "tickers": ["$NVDA", "$amd"]
        }))
        .unwrap();

        let item = news_from_raw(raw, None).unwrap();
        assert_eq!(item.url, "https://example.com/b");
        assert_eq!(item.summary, "Semis up");
        assert_eq!(item.tickers, vec!["NVDA", "AMD"]);
        assert_eq!(item.publisher, "Unknown");
    }

    #[test]
    fn article_with_several_spellings_keeps_the_primary_one() {
        let raw: RawArticle = serde_json::from_value(serde_json::json!({
            "title": "Fed holds rates",
            "link": "https://example.com/primary",
            "url": "https://example.com/secondary",
            "description": "Short take",
            "summary": "Longer take",
            "publisher": "AP",
            "publishedAt": "2023-10-16T19:05:00Z"
        }))
        .unwrap();

        let item = news_from_raw(raw, None).unwrap();
        assert_eq!(item.url, "https://example.com/primary");
        assert_eq!(item.summary, "Short take");
        assert_eq!(item.publisher, "AP");
        assert_eq!(
            item.published_at,
            Utc.with_ymd_and_hms(2023, 10, 16, 19, 5, 0).unwrap()
        );
    }

    #[test]
    fn drops_untitled_articles() {
        let raw: RawArticle = serde_json::from_value(serde_json::json!({
            "title": "  ",
            "link": "https://example.com/c"
        }))
        .unwrap();
        assert!(news_from_raw(raw, None).is_none());
    }
}
