use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use marketdesk_agents::parser::parse_json_reply;
use marketdesk_agents::{AgentError, LlmRequest, ModelFamily, ResponseFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_TEMPERATURE: f32 = 0.7;
const MAX_TEMPERATURE: f32 = 2.0;
const SUPPORTED_PREFIXES: [&str; 6] = ["gemini", "gpt-", "o1", "o3", "o4", "chatgpt"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBody {
    pub prompt: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub response_format: Option<ResponseFormat>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// Raw text, or the parsed JSON value when `responseFormat` was `json`.
    pub result: Value,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// POST /api/llm/analyze -- forward a prompt to Gemini or OpenAI
pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(body) = body?;

    let prompt = match body.prompt {
        Some(p) if !p.trim().is_empty() => p,
        _ => return Err(ApiError::bad_request("Missing required field: prompt")),
    };

    let model = body
        .model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| state.config.llm.default_model.clone());
    let family = ModelFamily::for_model(&model).map_err(|_| {
        ApiError::bad_request(format!("Unsupported model: {model}"))
            .with_field("supportedPrefixes", SUPPORTED_PREFIXES.to_vec())
    })?;

    let temperature = body.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(ApiError::bad_request(format!(
            "temperature must be between 0 and {MAX_TEMPERATURE}"
        )));
    }

    let response_format = body.response_format.unwrap_or_default();
    let request = LlmRequest {
        model: model.clone(),
        system_prompt: body.system_prompt.filter(|s| !s.trim().is_empty()),
        prompt,
        temperature,
        response_format,
    };

    let text = state
        .llm
        .complete(&request)
        .await
        .map_err(|e| ApiError::internal(failure_message(&e), e))?;

    let result = match response_format {
        ResponseFormat::Text => Value::String(text),
        ResponseFormat::Json => parse_json_reply(&text)
            .map_err(|e| ApiError::internal("LLM returned invalid JSON", e))?,
    };

    info!(model = %model, provider = family.name(), format = ?response_format, "LLM analysis complete");

    Ok(Json(AnalyzeResponse {
        result,
        model,
        timestamp: Utc::now(),
    }))
}

fn failure_message(e: &AgentError) -> &'static str {
    match e {
        AgentError::MissingApiKey(_) => "LLM provider is not configured",
        _ => "LLM analysis failed",
    }
}
