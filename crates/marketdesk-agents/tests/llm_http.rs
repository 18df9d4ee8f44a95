//! `HttpLlmClient` against an in-process fake of the Gemini and OpenAI APIs.

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use marketdesk_agents::parser::parse_json_reply;
use marketdesk_agents::{AgentError, HttpLlmClient, LlmClient, LlmRequest, ResponseFormat};
use marketdesk_models::config::{Credentials, LlmConfig};
use serde_json::{json, Value};

async fn gemini(
    Path(model_action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("gemini-key") {
        return (StatusCode::FORBIDDEN, "API key not valid").into_response();
    }
    let Some(model) = model_action.strip_suffix(":generateContent") else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if model == "gemini-broken" {
        return (StatusCode::SERVICE_UNAVAILABLE, "model overloaded").into_response();
    }

    let mime = body["generationConfig"]["responseMimeType"].clone();
    let system = body["systemInstruction"]["parts"][0]["text"].clone();
    let prompt = body["contents"][0]["parts"][0]["text"].clone();
    let text = json!({
        "model": model,
        "mime": mime,
        "system": system,
        "prompt": prompt,
        "temperature": body["generationConfig"]["temperature"],
    })
    .to_string();

    Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": "```json\n"}, {"text": text}, {"text": "\n```"}]}
        }]
    }))
    .into_response()
}

async fn openai(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != "Bearer openai-key" {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }

    let roles: Vec<Value> = body["messages"]
        .as_array()
        .map(|m| m.iter().map(|msg| msg["role"].clone()).collect())
        .unwrap_or_default();
    let content = json!({
        "model": body["model"],
        "format": body["response_format"]["type"],
        "roles": roles,
    })
    .to_string();

    Json(json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    }))
    .into_response()
}

async fn spawn_fake() -> String {
    let router = Router::new()
        .route("/gemini/models/:model_action", post(gemini))
        .route("/openai/chat/completions", post(openai));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str, credentials: Credentials) -> HttpLlmClient {
    let config = LlmConfig {
        gemini_base_url: format!("{base}/gemini"),
        openai_base_url: format!("{base}/openai/"),
        timeout_seconds: 5,
        ..LlmConfig::default()
    };
    HttpLlmClient::new(&config, credentials).unwrap()
}

fn keys() -> Credentials {
    Credentials {
        gemini_api_key: Some("gemini-key".to_string()),
        openai_api_key: Some("openai-key".to_string()),
        rapidapi_key: None,
    }
}

fn request(model: &str, format: ResponseFormat) -> LlmRequest {
    LlmRequest {
        model: model.to_string(),
        system_prompt: Some("Be brief.".to_string()),
        prompt: "Summarize AAPL".to_string(),
        temperature: 0.5,
        response_format: format,
    }
}

#[tokio::test]
async fn gemini_request_shape() {
    let base = spawn_fake().await;
    let reply = client(&base, keys())
        .complete(&request("gemini-2.0-flash", ResponseFormat::Json))
        .await
        .unwrap();

    let echoed = parse_json_reply(&reply).unwrap();
    assert_eq!(echoed["model"], "gemini-2.0-flash");
    assert_eq!(echoed["mime"], "application/json");
    assert_eq!(echoed["system"], "Be brief.");
    assert_eq!(echoed["prompt"], "Summarize AAPL");
    assert_eq!(echoed["temperature"], 0.5);
}

#[tokio::test]
async fn gemini_text_mode_sets_no_mime_type() {
    let base = spawn_fake().await;
    let reply = client(&base, keys())
        .complete(&request("gemini-1.5-pro", ResponseFormat::Text))
        .await
        .unwrap();
    let echoed = parse_json_reply(&reply).unwrap();
    assert!(echoed["mime"].is_null());
}

#[tokio::test]
async fn openai_request_shape() {
    let base = spawn_fake().await;
    let llm = client(&base, keys());

    let reply = llm
        .complete(&request("gpt-4o-mini", ResponseFormat::Json))
        .await
        .unwrap();
    let echoed: Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(echoed["model"], "gpt-4o-mini");
    assert_eq!(echoed["format"], "json_object");
    assert_eq!(echoed["roles"], json!(["system", "system", "user"]));

    let reply = llm
        .complete(&request("o3-mini", ResponseFormat::Text))
        .await
        .unwrap();
    let echoed: Value = serde_json::from_str(&reply).unwrap();
    assert!(echoed["format"].is_null());
    assert_eq!(echoed["roles"], json!(["system", "user"]));
}

#[tokio::test]
async fn upstream_status_is_surfaced() {
    let base = spawn_fake().await;
    let err = client(&base, keys())
        .complete(&request("gemini-broken", ResponseFormat::Text))
        .await
        .unwrap_err();
    match err {
        AgentError::Upstream {
            provider,
            status,
            body,
        } => {
            assert_eq!(provider, "gemini");
            assert_eq!(status, 503);
            assert!(body.contains("overloaded"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn wrong_key_is_an_upstream_error() {
    let base = spawn_fake().await;
    let credentials = Credentials {
        openai_api_key: Some("stale".to_string()),
        ..keys()
    };
    let err = client(&base, credentials)
        .complete(&request("gpt-4o", ResponseFormat::Text))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Upstream { status: 401, .. }));
}

#[tokio::test]
async fn unsupported_model_never_reaches_the_network() {
    let llm = client("http://127.0.0.1:9", keys());
    let err = llm
        .complete(&request("llama-3", ResponseFormat::Text))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::UnsupportedModel(ref m) if m == "llama-3"));
}
