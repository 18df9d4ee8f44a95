use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("LLM HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM provider {provider} returned status {status}: {body}")]
    Upstream {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("LLM response parse error: {0}")]
    Parse(String),

    #[error("LLM call timed out after {0} seconds")]
    Timeout(u64),

    #[error("All agents failed: {0}")]
    AllAgentsFailed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
