use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use marketdesk_agents::{AgentError, OrchestrationPlan, RunContext};
use marketdesk_models::agent_message::{AgentResult, AgentType, LlmProvider, OrchestrationResult};
use marketdesk_models::params::{is_valid_period, normalize_ticker, TickerError, DEFAULT_PERIOD};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_TICKER: &str = "AAPL";

#[derive(Debug, Deserialize)]
pub struct AgentQuery {
    pub agent: Option<String>,
    pub ticker: Option<String>,
    pub period: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrateBody {
    pub agents: Option<Vec<String>>,
    pub ticker: Option<String>,
    pub period: Option<String>,
    pub model: Option<String>,
    pub sequential: Option<bool>,
    pub primary_agent: Option<String>,
}

/// GET /api/agents -- run a single agent
pub async fn run_agent(
    State(state): State<AppState>,
    query: Result<Query<AgentQuery>, QueryRejection>,
) -> Result<Json<AgentResult>, ApiError> {
    let Query(q) = query?;

    let agent = match q.agent.as_deref().map(str::trim) {
        None | Some("") => return Err(ApiError::bad_request("Missing required parameter: agent")),
        Some(name) => parse_agent(name)?,
    };
    let ctx = run_context(q.ticker.as_deref(), q.period.as_deref(), q.model.as_deref())?;

    state
        .orchestrator
        .runner()
        .run(agent, &ctx, Vec::new())
        .await
        .map(Json)
        .map_err(|e| ApiError::internal("Agent analysis failed", e))
}

/// POST /api/agents -- run several agents, sequentially or in parallel
pub async fn orchestrate_agents(
    State(state): State<AppState>,
    body: Result<Json<OrchestrateBody>, JsonRejection>,
) -> Result<Json<OrchestrationResult>, ApiError> {
    let Json(body) = body?;

    let names = body.agents.unwrap_or_default();
    if names.is_empty() {
        return Err(ApiError::bad_request("agents must be a non-empty array of agent types")
            .with_field("validTypes", AgentType::valid_names()));
    }
    let agents = names
        .iter()
        .map(|name| parse_agent(name))
        .collect::<Result<Vec<_>, _>>()?;
    let primary = body
        .primary_agent
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(parse_agent)
        .transpose()?;
    let ctx = run_context(
        body.ticker.as_deref(),
        body.period.as_deref(),
        body.model.as_deref(),
    )?;

    let plan = OrchestrationPlan::new(
        &agents,
        primary,
        body.sequential.unwrap_or(false),
        &ctx.ticker,
        &ctx.period,
        ctx.model,
    );

    match state.orchestrator.run(&plan).await {
        Ok(result) => Ok(Json(result)),
        Err(AgentError::AllAgentsFailed(details)) => {
            Err(ApiError::internal("All agents failed", details))
        }
        Err(e) => Err(ApiError::internal("Agent orchestration failed", e)),
    }
}

fn parse_agent(name: &str) -> Result<AgentType, ApiError> {
    name.parse::<AgentType>().map_err(|_| {
        ApiError::bad_request(format!("Invalid agent type: {name}"))
            .with_field("validTypes", AgentType::valid_names())
    })
}

/// Ticker, period and model with their agent-endpoint defaults applied.
fn run_context(
    ticker: Option<&str>,
    period: Option<&str>,
    model: Option<&str>,
) -> Result<RunContext, ApiError> {
    let ticker = match normalize_ticker(ticker) {
        Ok(t) => t,
        Err(TickerError::Missing) => DEFAULT_TICKER.to_string(),
        Err(e) => return Err(e.into()),
    };

    let period = period.map(str::trim).filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PERIOD);
    if !is_valid_period(period) {
        return Err(ApiError::bad_request(format!("Invalid period: {period}")));
    }

    let model = match model.map(str::trim).filter(|m| !m.is_empty()) {
        None => LlmProvider::default(),
        Some(m) => m.parse::<LlmProvider>().map_err(|_| {
            ApiError::bad_request(format!("Invalid model: {m}"))
                .with_field("validModels", LlmProvider::valid_names())
        })?,
    };

    Ok(RunContext {
        ticker,
        period: period.to_string(),
        model,
    })
}
