//! Mock LLM backends for tests in this and downstream crates.
//!
//! `MockLlm` reads the `AgentRequest` an agent sends as its user prompt and
//! answers with a JSON analysis naming the agent and the earlier analyses it
//! was shown, so orchestration order is observable from the results.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use marketdesk_models::agent_message::{AgentRequest, AgentType};

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmRequest};

#[derive(Default)]
pub struct MockLlm {
    text: Option<String>,
    failing: HashSet<AgentType>,
    panicking: HashSet<AgentType>,
    delay: Option<Duration>,
    calls: Mutex<Vec<LlmRequest>>,
    completed: AtomicUsize,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `text` verbatim to every request.
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    /// Fail requests from `agent` with an upstream 503.
    pub fn failing_for(mut self, agent: AgentType) -> Self {
        self.failing.insert(agent);
        self
    }

    /// Panic on requests from `agent`.
    pub fn panicking_for(mut self, agent: AgentType) -> Self {
        self.panicking.insert(agent);
        self
    }

    /// Wait `delay` before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests answered (after any delay).
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<LlmRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<String, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        let agent_request = serde_json::from_str::<AgentRequest>(&request.prompt).ok();

        if let Some(agent) = agent_request.as_ref().map(|r| r.agent_type) {
            if self.panicking.contains(&agent) {
                panic!("mock LLM panic for {agent}");
            }
            if self.failing.contains(&agent) {
                return Err(AgentError::Upstream {
                    provider: "mock",
                    status: 503,
                    body: format!("{agent} unavailable"),
                });
            }
        }

        if let Some(text) = &self.text {
            return Ok(text.clone());
        }

        let reply = match agent_request {
            Some(r) => serde_json::json!({
                "agent": r.agent_type,
                "summary": format!("{} view on {}", r.agent_type, r.ticker),
                "signal": "neutral",
                "confidence": 0.5,
                "keyPoints": [],
                "risks": [],
                "sawPrevious": r.previous_analyses.iter().map(|p| p.agent).collect::<Vec<_>>(),
            }),
            None => serde_json::json!({ "echo": request.prompt }),
        };
        Ok(format!("```json\n{reply}\n```"))
    }
}
