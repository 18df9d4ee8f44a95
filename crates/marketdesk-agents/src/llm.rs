use std::time::Duration;

use async_trait::async_trait;
use marketdesk_models::config::{Credentials, LlmConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::AgentError;

const OPENAI_PREFIXES: [&str; 5] = ["gpt-", "o1", "o3", "o4", "chatgpt"];
const JSON_INSTRUCTION: &str = "Respond with a single valid JSON object and nothing else.";

/// Requested shape of the model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// LLM vendor API a concrete model name is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Gemini,
    OpenAi,
}

impl ModelFamily {
    /// Dispatch on the model name prefix. Names go into request paths, so only
    /// ASCII alphanumerics, `.`, `_` and `-` are accepted.
    pub fn for_model(model: &str) -> Result<Self, AgentError> {
        let valid_chars = model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid_chars {
            return Err(AgentError::UnsupportedModel(model.to_string()));
        }

        let lower = model.to_ascii_lowercase();
        if lower.starts_with("gemini") {
            Ok(ModelFamily::Gemini)
        } else if OPENAI_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            Ok(ModelFamily::OpenAi)
        } else {
            Err(AgentError::UnsupportedModel(model.to_string()))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::Gemini => "gemini",
            ModelFamily::OpenAi => "openai",
        }
    }
}

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

/// A text-completion backend. Mockable for testing.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the raw text of the model's reply.
    async fn complete(&self, request: &LlmRequest) -> Result<String, AgentError>;
}

/// Calls Gemini `generateContent` or OpenAI `chat/completions` over HTTP.
pub struct HttpLlmClient {
    http: reqwest::Client,
    gemini_base_url: String,
    openai_base_url: String,
    credentials: Credentials,
    timeout: Duration,
}

impl HttpLlmClient {
    pub fn new(config: &LlmConfig, credentials: Credentials) -> Result<Self, AgentError> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            gemini_base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            openai_base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            credentials,
            timeout,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> AgentError {
        if e.is_timeout() {
            AgentError::Timeout(self.timeout.as_secs())
        } else {
            AgentError::Http(e)
        }
    }

    async fn read_success(
        &self,
        provider: &'static str,
        response: reqwest::Response,
    ) -> Result<serde_json::Value, AgentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(provider, status = status.as_u16(), "LLM request failed");
            return Err(AgentError::Upstream {
                provider,
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }
        response.json().await.map_err(|e| self.map_send_error(e))
    }

    async fn complete_gemini(&self, request: &LlmRequest) -> Result<String, AgentError> {
        let key = self
            .credentials
            .gemini_api_key
            .as_deref()
            .ok_or(AgentError::MissingApiKey(Credentials::GEMINI_ENV))?;

        let mut generation_config = json!({ "temperature": request.temperature });
        if request.response_format == ResponseFormat::Json {
            generation_config["responseMimeType"] = json!("application/json");
        }
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": generation_config,
        });
        if let Some(system) = &request.system_prompt {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        let url = format!(
            "{}/models/{}:generateContent",
            self.gemini_base_url, request.model
        );
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let payload: GeminiResponse =
            serde_json::from_value(self.read_success("gemini", response).await?)?;
        let text: String = payload
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        non_empty(text, "gemini")
    }

    async fn complete_openai(&self, request: &LlmRequest) -> Result<String, AgentError> {
        let key = self
            .credentials
            .openai_api_key
            .as_deref()
            .ok_or(AgentError::MissingApiKey(Credentials::OPENAI_ENV))?;

        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(json!({ "role": "system", "content": system }));
        }
        if request.response_format == ResponseFormat::Json {
            messages.push(json!({ "role": "system", "content": JSON_INSTRUCTION }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));

        let mut body = json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
        });
        if request.response_format == ResponseFormat::Json {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let url = format!("{}/chat/completions", self.openai_base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let payload: OpenAiResponse =
            serde_json::from_value(self.read_success("openai", response).await?)?;
        let text = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        non_empty(text, "openai")
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<String, AgentError> {
        let family = ModelFamily::for_model(&request.model)?;
        debug!(model = %request.model, provider = family.name(), "Invoking LLM");
        match family {
            ModelFamily::Gemini => self.complete_gemini(request).await,
            ModelFamily::OpenAi => self.complete_openai(request).await,
        }
    }
}

fn non_empty(text: String, provider: &str) -> Result<String, AgentError> {
    if text.trim().is_empty() {
        return Err(AgentError::Parse(format!("{provider} returned an empty response")));
    }
    Ok(text)
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}
