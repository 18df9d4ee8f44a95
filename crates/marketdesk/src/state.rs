use std::sync::Arc;
use std::time::Instant;

use marketdesk_agents::{AgentRunner, AgentSettings, LlmClient, Orchestrator};
use marketdesk_market::{MarketData, NewsService};
use marketdesk_models::config::{Credentials, MarketdeskConfig};
use serde::Serialize;

/// Which upstream keys are configured. Reported by `/health`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub gemini: bool,
    pub openai: bool,
    pub rapidapi: bool,
}

impl From<&Credentials> for ProviderStatus {
    fn from(credentials: &Credentials) -> Self {
        Self {
            gemini: credentials.gemini_api_key.is_some(),
            openai: credentials.openai_api_key.is_some(),
            rapidapi: credentials.rapidapi_key.is_some(),
        }
    }
}

/// Shared state for route handlers. Everything inside is immutable or
/// internally synchronized.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MarketdeskConfig>,
    pub market: Arc<MarketData>,
    pub news: Arc<NewsService>,
    pub llm: Arc<dyn LlmClient>,
    pub orchestrator: Arc<Orchestrator>,
    pub providers: ProviderStatus,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: MarketdeskConfig,
        market: MarketData,
        news: NewsService,
        llm: Arc<dyn LlmClient>,
        providers: ProviderStatus,
    ) -> Self {
        let market = Arc::new(market);
        let news = Arc::new(news);
        let runner = AgentRunner::new(
            Arc::clone(&llm),
            Arc::clone(&market),
            Arc::clone(&news),
            AgentSettings::from(&config.llm),
        );

        Self {
            config: Arc::new(config),
            market,
            news,
            llm,
            orchestrator: Arc::new(Orchestrator::new(Arc::new(runner))),
            providers,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
