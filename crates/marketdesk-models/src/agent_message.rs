use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::market::{DataSource, NewsItem, OptionsChain, Quote, TechnicalInsights, TimeSeries};

/// The named analysis tasks an LLM agent can perform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    TechnicalAnalyst,
    FundamentalAnalyst,
    SentimentAnalyst,
    OptionsAnalyst,
    RiskManager,
    PortfolioManager,
}

impl AgentType {
    pub const ALL: [AgentType; 6] = [
        AgentType::TechnicalAnalyst,
        AgentType::FundamentalAnalyst,
        AgentType::SentimentAnalyst,
        AgentType::OptionsAnalyst,
        AgentType::RiskManager,
        AgentType::PortfolioManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::TechnicalAnalyst => "technical-analyst",
            AgentType::FundamentalAnalyst => "fundamental-analyst",
            AgentType::SentimentAnalyst => "sentiment-analyst",
            AgentType::OptionsAnalyst => "options-analyst",
            AgentType::RiskManager => "risk-manager",
            AgentType::PortfolioManager => "portfolio-manager",
        }
    }

    /// Wire names of every agent type, in declaration order.
    pub fn valid_names() -> Vec<&'static str> {
        Self::ALL.iter().map(AgentType::as_str).collect()
    }

    /// The market inputs this agent type is given.
    pub fn inputs(&self) -> &'static [AgentInput] {
        use AgentInput::*;
        match self {
            AgentType::TechnicalAnalyst => &[MarketData, TimeSeries, TechnicalInsights],
            AgentType::FundamentalAnalyst => &[MarketData],
            AgentType::SentimentAnalyst => &[MarketData, News],
            AgentType::OptionsAnalyst => &[MarketData, OptionsData, TechnicalInsights],
            AgentType::RiskManager => &[MarketData, TimeSeries, TechnicalInsights, OptionsData],
            AgentType::PortfolioManager => &[MarketData, TechnicalInsights],
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown agent type: {0}")]
pub struct UnknownAgentType(pub String);

impl FromStr for AgentType {
    type Err = UnknownAgentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == needle)
            .ok_or_else(|| UnknownAgentType(s.to_string()))
    }
}

/// A market input an agent request can carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AgentInput {
    MarketData,
    TimeSeries,
    TechnicalInsights,
    OptionsData,
    News,
}

/// LLM vendor selected by the agent endpoints' `model` parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 2] = [LlmProvider::OpenAi, LlmProvider::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini",
            LlmProvider::OpenAi => "openai",
        }
    }

    pub fn valid_names() -> Vec<&'static str> {
        Self::ALL.iter().map(LlmProvider::as_str).collect()
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown model provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for LlmProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(LlmProvider::Gemini),
            "openai" => Ok(LlmProvider::OpenAi),
            _ => Err(UnknownProvider(s.trim().to_string())),
        }
    }
}

/// Analysis produced by an earlier agent in the same orchestration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviousAnalysis {
    pub agent: AgentType,
    pub analysis: serde_json::Value,
}

/// Request handed to an LLM-backed agent (serialized as the user prompt).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub request_id: Uuid,
    pub agent_type: AgentType,
    pub ticker: String,
    pub model: LlmProvider,
    pub period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_data: Option<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_insights: Option<TechnicalInsights>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_series: Option<TimeSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_data: Option<OptionsChain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub news: Option<Vec<NewsItem>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_analyses: Vec<PreviousAnalysis>,
}

impl AgentRequest {
    /// Inputs actually present on this request.
    pub fn present_inputs(&self) -> Vec<AgentInput> {
        let mut inputs = Vec::new();
        if self.market_data.is_some() {
            inputs.push(AgentInput::MarketData);
        }
        if self.time_series.is_some() {
            inputs.push(AgentInput::TimeSeries);
        }
        if self.technical_insights.is_some() {
            inputs.push(AgentInput::TechnicalInsights);
        }
        if self.options_data.is_some() {
            inputs.push(AgentInput::OptionsData);
        }
        if self.news.is_some() {
            inputs.push(AgentInput::News);
        }
        inputs
    }
}

/// Outcome of a single agent run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub agent: AgentType,
    pub ticker: String,
    pub model: LlmProvider,
    /// Structured analysis returned by the LLM.
    pub analysis: serde_json::Value,
    /// `mock` when any market input fell back to synthetic data.
    pub data_source: DataSource,
    pub inputs: Vec<AgentInput>,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentFailure {
    pub agent: AgentType,
    pub error: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

/// Combined outcome of a multi-agent run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    pub run_id: Uuid,
    pub ticker: String,
    pub model: LlmProvider,
    pub mode: ExecutionMode,
    /// Agents requested for the fan-out, after de-duplication.
    pub agents: Vec<AgentType>,
    pub results: Vec<AgentResult>,
    pub failures: Vec<AgentFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<AgentResult>,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
}
