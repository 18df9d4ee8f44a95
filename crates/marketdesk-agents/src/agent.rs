use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use marketdesk_market::{MarketData, NewsService};
use marketdesk_models::agent_message::{AgentResult, AgentType, LlmProvider, PreviousAnalysis};
use marketdesk_models::config::LlmConfig;
use tracing::{info, warn};

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmRequest, ResponseFormat};
use crate::parser::analysis_from_reply;
use crate::prepare::prepare_agent_request;
use crate::prompts::system_prompt;

/// Concrete model names and sampling temperature used for agent runs.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub gemini_model: String,
    pub openai_model: String,
    pub temperature: f32,
}

impl AgentSettings {
    pub fn model_for(&self, provider: LlmProvider) -> &str {
        match provider {
            LlmProvider::Gemini => &self.gemini_model,
            LlmProvider::OpenAi => &self.openai_model,
        }
    }
}

impl From<&LlmConfig> for AgentSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            gemini_model: config.gemini_agent_model.clone(),
            openai_model: config.openai_agent_model.clone(),
            temperature: config.agent_temperature,
        }
    }
}

/// Parameters shared by every agent in one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub ticker: String,
    pub period: String,
    pub model: LlmProvider,
}

/// Runs a single agent: gathers its inputs, asks the LLM, parses the analysis.
pub struct AgentRunner {
    llm: Arc<dyn LlmClient>,
    market: Arc<MarketData>,
    news: Arc<NewsService>,
    settings: AgentSettings,
}

impl AgentRunner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        market: Arc<MarketData>,
        news: Arc<NewsService>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            llm,
            market,
            news,
            settings,
        }
    }

    pub async fn run(
        &self,
        agent: AgentType,
        ctx: &RunContext,
        previous_analyses: Vec<PreviousAnalysis>,
    ) -> Result<AgentResult, AgentError> {
        let start = Instant::now();

        let mut prepared = prepare_agent_request(
            agent,
            &ctx.ticker,
            &ctx.period,
            ctx.model,
            &self.market,
            &self.news,
        )
        .await;
        prepared.request.previous_analyses = previous_analyses;

        let llm_request = LlmRequest {
            model: self.settings.model_for(ctx.model).to_string(),
            system_prompt: Some(system_prompt(agent)),
            prompt: serde_json::to_string(&prepared.request)?,
            temperature: self.settings.temperature,
            response_format: ResponseFormat::Json,
        };

        let reply = self.llm.complete(&llm_request).await.map_err(|e| {
            warn!(agent = %agent, ticker = %ctx.ticker, error = %e, "Agent LLM call failed");
            e
        })?;
        let analysis = analysis_from_reply(&reply);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            agent = %agent,
            ticker = %ctx.ticker,
            model = %llm_request.model,
            source = prepared.data_source.as_str(),
            elapsed_ms,
            "Agent succeeded"
        );

        Ok(AgentResult {
            agent,
            ticker: ctx.ticker.clone(),
            model: ctx.model,
            analysis,
            data_source: prepared.data_source,
            inputs: prepared.request.present_inputs(),
            elapsed_ms,
            timestamp: Utc::now(),
        })
    }
}
