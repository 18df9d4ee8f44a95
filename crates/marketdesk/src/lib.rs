//! marketdesk - market dashboard backend
//!
//! Serves quotes, price series with technical indicators, options chains and
//! news over JSON, falling back to deterministic mock data whenever an
//! upstream API or key is unavailable, and runs LLM-backed analysis agents
//! (Gemini or OpenAI) over that data.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use marketdesk::models::config::{Credentials, MarketdeskConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let state = marketdesk::build_state(MarketdeskConfig::default(), Credentials::from_env())?;
//! let app = marketdesk::create_router(state);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use marketdesk_agents as agents;
pub use marketdesk_market as market;
pub use marketdesk_models as models;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, ProviderStatus};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use marketdesk_agents::HttpLlmClient;
use marketdesk_market::sources::build_http_client;
use marketdesk_market::{build_market_data, build_news};
use marketdesk_models::config::{Credentials, MarketdeskConfig};
use tracing::warn;

/// Load configuration from a TOML file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> anyhow::Result<MarketdeskConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(MarketdeskConfig::default());
    }

    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Wire the live upstream clients into application state.
pub fn build_state(config: MarketdeskConfig, credentials: Credentials) -> anyhow::Result<AppState> {
    let http = build_http_client(Duration::from_secs(config.upstream.request_timeout_seconds))
        .context("Failed to build upstream HTTP client")?;
    let market = build_market_data(&config.upstream, &config.cache, http.clone());
    let news = build_news(&config.upstream, &credentials, http);
    let llm = HttpLlmClient::new(&config.llm, credentials.clone())
        .context("Failed to build LLM client")?;

    Ok(AppState::new(
        config,
        market,
        news,
        Arc::new(llm),
        ProviderStatus::from(&credentials),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_uses_defaults() {
        let config = load_config(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config, MarketdeskConfig::default());
    }

    #[test]
    fn shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/marketdesk.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:3001");
        assert_eq!(config.llm.default_model, "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn build_state_reports_configured_providers() {
        let credentials = Credentials {
            gemini_api_key: Some("g".to_string()),
            openai_api_key: None,
            rapidapi_key: Some("r".to_string()),
        };
        let state = build_state(MarketdeskConfig::default(), credentials).unwrap();
        assert!(state.providers.gemini);
        assert!(!state.providers.openai);
        assert!(state.providers.rapidapi);
        assert!(state.news.is_live());
    }
}
