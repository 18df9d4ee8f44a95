use marketdesk_market::indicators::technical_insights;
use marketdesk_market::{MarketData, NewsService, Sourced};
use marketdesk_models::agent_message::{AgentInput, AgentRequest, AgentType, LlmProvider};
use marketdesk_models::market::DataSource;
use marketdesk_models::params::DEFAULT_INTERVAL;
use tracing::debug;
use uuid::Uuid;

const NEWS_LANGUAGE: &str = "en";

/// An agent request with its market inputs filled in.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub request: AgentRequest,
    /// `Mock` when any input fell back to synthetic data.
    pub data_source: DataSource,
}

/// Fetch the inputs `agent_type` needs, one after another, through the
/// fallback services. Never fails: unavailable upstream data is mocked.
pub async fn prepare_agent_request(
    agent_type: AgentType,
    ticker: &str,
    period: &str,
    model: LlmProvider,
    market: &MarketData,
    news: &NewsService,
) -> PreparedRequest {
    let wanted = agent_type.inputs();
    let wants = |input: AgentInput| wanted.contains(&input);
    let mut any_mock = false;
    let mut track = |source: DataSource| any_mock |= source == DataSource::Mock;

    let mut request = AgentRequest {
        request_id: Uuid::new_v4(),
        agent_type,
        ticker: ticker.to_string(),
        model,
        period: period.to_string(),
        market_data: None,
        technical_insights: None,
        time_series: None,
        options_data: None,
        news: None,
        previous_analyses: Vec::new(),
    };

    if wants(AgentInput::MarketData) {
        let Sourced { data, source } = market.quote(ticker).await;
        track(source);
        request.market_data = Some(data);
    }

    if wants(AgentInput::TimeSeries) || wants(AgentInput::TechnicalInsights) {
        let Sourced { data, source } = market.time_series(ticker, period, DEFAULT_INTERVAL).await;
        track(source);
        if wants(AgentInput::TechnicalInsights) {
            request.technical_insights = technical_insights(&data);
        }
        if wants(AgentInput::TimeSeries) {
            request.time_series = Some(data);
        }
    }

    if wants(AgentInput::OptionsData) {
        let Sourced { data, source } = market.options_chain(ticker, None).await;
        track(source);
        request.options_data = Some(data);
    }

    if wants(AgentInput::News) {
        let Sourced { data, source } = news.news(Some(ticker), NEWS_LANGUAGE).await;
        track(source);
        request.news = Some(data);
    }

    let data_source = if any_mock {
        DataSource::Mock
    } else {
        DataSource::Api
    };
    debug!(
        agent = %agent_type,
        ticker,
        inputs = ?request.present_inputs(),
        source = data_source.as_str(),
        "Prepared agent request"
    );

    PreparedRequest {
        request,
        data_source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketdesk_market::test_support::{FailingProvider, FixedNewsProvider, FixedProvider};
    use std::sync::Arc;

    fn live() -> (MarketData, NewsService) {
        (
            MarketData::new(Arc::new(FixedProvider::default()), None),
            NewsService::new(Some(Arc::new(FixedNewsProvider)), 5),
        )
    }

    #[tokio::test]
    async fn technical_analyst_gets_series_and_insights() {
        let (market, news) = live();
        let prepared = prepare_agent_request(
            AgentType::TechnicalAnalyst,
            "AAPL",
            "3mo",
            LlmProvider::Gemini,
            &market,
            &news,
        )
        .await;

        let request = &prepared.request;
        assert_eq!(prepared.data_source, DataSource::Api);
        assert_eq!(request.period, "3mo");
        assert!(request.market_data.is_some());
        assert!(request.time_series.is_some());
        assert!(request.technical_insights.is_some());
        assert!(request.options_data.is_none());
        assert!(request.news.is_none());
        assert_eq!(request.present_inputs(), AgentType::TechnicalAnalyst.inputs());
    }

    #[tokio::test]
    async fn options_analyst_gets_insights_without_series() {
        let (market, news) = live();
        let prepared = prepare_agent_request(
            AgentType::OptionsAnalyst,
            "MSFT",
            "1mo",
            LlmProvider::OpenAi,
            &market,
            &news,
        )
        .await;

        assert!(prepared.request.time_series.is_none());
        assert!(prepared.request.technical_insights.is_some());
        assert!(prepared.request.options_data.is_some());
        assert_eq!(prepared.request.model, LlmProvider::OpenAi);
    }

    #[tokio::test]
    async fn sentiment_analyst_gets_ticker_news() {
        let (market, news) = live();
        let prepared = prepare_agent_request(
            AgentType::SentimentAnalyst,
            "TSLA",
            "1mo",
            LlmProvider::Gemini,
            &market,
            &news,
        )
        .await;

        let items = prepared.request.news.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].tickers, vec!["TSLA"]);
    }

    #[tokio::test]
    async fn any_mock_input_marks_the_request_mock() {
        let market = MarketData::new(Arc::new(FixedProvider::default()), None);
        let news = NewsService::new(None, 3);
        let prepared = prepare_agent_request(
            AgentType::SentimentAnalyst,
            "TSLA",
            "1mo",
            LlmProvider::Gemini,
            &market,
            &news,
        )
        .await;
        assert_eq!(prepared.data_source, DataSource::Mock);

        let market = MarketData::new(Arc::new(FailingProvider), None);
        let prepared = prepare_agent_request(
            AgentType::FundamentalAnalyst,
            "TSLA",
            "1mo",
            LlmProvider::Gemini,
            &market,
            &news,
        )
        .await;
        assert_eq!(prepared.data_source, DataSource::Mock);
        assert_eq!(prepared.request.market_data.unwrap().symbol, "TSLA");
    }
}
