use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level configuration for marketdesk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MarketdeskConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub llm: LlmConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    pub bind: String,
    /// Allow cross-origin requests from any origin (dashboard front-end).
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".to_string(),
            cors_allow_any: true,
        }
    }
}

/// Market-data and news upstreams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL for the Yahoo chart API (quotes and series).
    pub yahoo_chart_url: String,
    /// Base URL for the Yahoo options API.
    pub yahoo_options_url: String,
    /// RapidAPI host serving market news.
    pub rapidapi_host: String,
    /// Base URL for the RapidAPI news host. Defaults to `https://{rapidapi_host}`.
    pub rapidapi_base_url: Option<String>,
    pub request_timeout_seconds: u64,
    /// Maximum news items returned per request.
    pub news_limit: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            yahoo_chart_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            yahoo_options_url: "https://query2.finance.yahoo.com/v7/finance/options".to_string(),
            rapidapi_host: "yahoo-finance15.p.rapidapi.com".to_string(),
            rapidapi_base_url: None,
            request_timeout_seconds: 10,
            news_limit: 20,
        }
    }
}

impl UpstreamConfig {
    pub fn rapidapi_base(&self) -> String {
        self.rapidapi_base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.rapidapi_host))
    }
}

/// LLM endpoints and model defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub gemini_base_url: String,
    pub openai_base_url: String,
    /// Model used by `/api/llm/analyze` when the request names none.
    pub default_model: String,
    /// Concrete model the agents use when `model=gemini`.
    pub gemini_agent_model: String,
    /// Concrete model the agents use when `model=openai`.
    pub openai_agent_model: String,
    /// Sampling temperature for agent runs.
    pub agent_temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            default_model: "gemini-2.0-flash".to_string(),
            gemini_agent_model: "gemini-2.0-flash".to_string(),
            openai_agent_model: "gpt-4o-mini".to_string(),
            agent_temperature: 0.3,
            timeout_seconds: 60,
        }
    }
}

/// In-memory hot cache for upstream market-data responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Maximum number of entries in the moka cache.
    pub max_capacity: u64,
    /// How long a live upstream response is reused, in seconds.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: 1_000,
            ttl_seconds: 30,
        }
    }
}

/// Upstream API keys. Read from the environment only, never from the config file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub rapidapi_key: Option<String>,
}

impl Credentials {
    pub const GEMINI_ENV: &'static str = "GEMINI_API_KEY";
    pub const OPENAI_ENV: &'static str = "OPENAI_API_KEY";
    pub const RAPIDAPI_ENV: &'static str = "RAPIDAPI_KEY";

    pub fn from_env() -> Self {
        Self {
            gemini_api_key: non_empty_env(Self::GEMINI_ENV),
            openai_api_key: non_empty_env(Self::OPENAI_ENV),
            rapidapi_key: non_empty_env(Self::RAPIDAPI_ENV),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("rapidapi_key", &redact(&self.rapidapi_key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_config() {
        let config = MarketdeskConfig::default();

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: MarketdeskConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: MarketdeskConfig = toml::from_str("").unwrap();
        assert_eq!(config, MarketdeskConfig::default());
        assert_eq!(config.llm.default_model, "gemini-2.0-flash");
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[server]
bind = "0.0.0.0:8080"

[upstream]
rapidapi_host = "news.example.com"
request_timeout_seconds = 5

[llm]
openai_agent_model = "gpt-4o"

[cache]
enabled = false
"#;

        let config: MarketdeskConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(config.server.cors_allow_any);
        assert_eq!(config.upstream.request_timeout_seconds, 5);
        assert_eq!(config.upstream.rapidapi_base(), "https://news.example.com");
        assert_eq!(config.llm.openai_agent_model, "gpt-4o");
        assert_eq!(config.llm.gemini_agent_model, "gemini-2.0-flash");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_seconds, 30);
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials {
            gemini_api_key: Some("secret-gemini".to_string()),
            openai_api_key: None,
            rapidapi_key: Some("secret-rapid".to_string()),
        };
        let out = format!("{creds:?}");
        assert!(!out.contains("secret"));
        assert!(out.contains("<set>"));
        assert!(out.contains("<unset>"));
    }
}
