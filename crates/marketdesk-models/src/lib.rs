pub mod agent_message;
pub mod config;
pub mod market;
pub mod params;

pub use agent_message::{
    AgentFailure, AgentInput, AgentRequest, AgentResult, AgentType, ExecutionMode, LlmProvider,
    OrchestrationResult, PreviousAnalysis,
};
pub use config::{CacheConfig, Credentials, LlmConfig, MarketdeskConfig, ServerConfig, UpstreamConfig};
pub use market::{
    BollingerBands, Candle, DataSource, MacdValue, NewsItem, OptionContract, OptionsChain, Quote,
    TechnicalInsights, TimeSeries, Trend,
};
