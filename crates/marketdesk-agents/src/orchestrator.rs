use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use marketdesk_models::agent_message::{
    AgentFailure, AgentResult, AgentType, ExecutionMode, LlmProvider, OrchestrationResult,
    PreviousAnalysis,
};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agent::{AgentRunner, RunContext};
use crate::error::AgentError;

/// What to run in one orchestration.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestrationPlan {
    /// Fan-out agents: de-duplicated, primary removed.
    pub agents: Vec<AgentType>,
    pub primary: Option<AgentType>,
    pub mode: ExecutionMode,
    pub ctx: RunContext,
}

impl OrchestrationPlan {
    pub fn new(
        requested: &[AgentType],
        primary: Option<AgentType>,
        sequential: bool,
        ticker: &str,
        period: &str,
        model: LlmProvider,
    ) -> Self {
        let mut agents: Vec<AgentType> = Vec::with_capacity(requested.len());
        for agent in requested {
            if Some(*agent) != primary && !agents.contains(agent) {
                agents.push(*agent);
            }
        }

        Self {
            agents,
            primary,
            mode: if sequential {
                ExecutionMode::Sequential
            } else {
                ExecutionMode::Parallel
            },
            ctx: RunContext {
                ticker: ticker.to_string(),
                period: period.to_string(),
                model,
            },
        }
    }
}

/// Coordinates agent runs and collects their results.
pub struct Orchestrator {
    runner: Arc<AgentRunner>,
}

impl Orchestrator {
    pub fn new(runner: Arc<AgentRunner>) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &AgentRunner {
        &self.runner
    }

    /// Run the plan. Failed agents are reported in `failures`; only when no
    /// agent at all succeeded is an error returned.
    pub async fn run(&self, plan: &OrchestrationPlan) -> Result<OrchestrationResult, AgentError> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            ticker = %plan.ctx.ticker,
            agents = ?plan.agents,
            primary = ?plan.primary,
            mode = ?plan.mode,
            "Starting orchestration"
        );

        let (results, mut failures) = match plan.mode {
            ExecutionMode::Sequential => self.run_sequential(plan).await,
            ExecutionMode::Parallel => self.run_parallel(plan).await,
        };

        let mut primary = None;
        if let Some(agent) = plan.primary {
            let previous = results.iter().map(previous_analysis).collect();
            match self.runner.run(agent, &plan.ctx, previous).await {
                Ok(result) => primary = Some(result),
                Err(e) => failures.push(failure(agent, &e)),
            }
        }

        if results.is_empty() && primary.is_none() {
            let details = failures
                .iter()
                .map(|f| format!("{}: {}", f.agent, f.error))
                .collect::<Vec<_>>()
                .join("; ");
            error!(%run_id, ticker = %plan.ctx.ticker, %details, "Every agent failed");
            return Err(AgentError::AllAgentsFailed(details));
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            %run_id,
            succeeded = results.len() + usize::from(primary.is_some()),
            failed = failures.len(),
            elapsed_ms,
            "Orchestration complete"
        );

        Ok(OrchestrationResult {
            run_id,
            ticker: plan.ctx.ticker.clone(),
            model: plan.ctx.model,
            mode: plan.mode,
            agents: plan.agents.clone(),
            results,
            failures,
            primary,
            elapsed_ms,
            timestamp: Utc::now(),
        })
    }

    /// Each agent sees the analyses of those that succeeded before it.
    async fn run_sequential(&self, plan: &OrchestrationPlan) -> (Vec<AgentResult>, Vec<AgentFailure>) {
        let mut results: Vec<AgentResult> = Vec::new();
        let mut failures = Vec::new();

        for agent in &plan.agents {
            let previous = results.iter().map(previous_analysis).collect();
            match self.runner.run(*agent, &plan.ctx, previous).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(agent = %agent, error = %e, "Agent failed");
                    failures.push(failure(*agent, &e));
                }
            }
        }

        (results, failures)
    }

    /// Fan out one task per agent; results keep the requested order.
    ///
    /// Tasks live in a `JoinSet`, so dropping the orchestration (a client
    /// disconnect) aborts the LLM calls still in flight.
    async fn run_parallel(&self, plan: &OrchestrationPlan) -> (Vec<AgentResult>, Vec<AgentFailure>) {
        let mut tasks = JoinSet::new();
        let mut slots = HashMap::with_capacity(plan.agents.len());
        for (index, agent) in plan.agents.iter().copied().enumerate() {
            let runner = Arc::clone(&self.runner);
            let ctx = plan.ctx.clone();
            let handle = tasks.spawn(async move { runner.run(agent, &ctx, Vec::new()).await });
            slots.insert(handle.id(), (index, agent));
        }

        let mut outcomes: Vec<Option<Result<AgentResult, AgentFailure>>> =
            (0..plan.agents.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, Ok(result))) => (id, Ok(result)),
                Ok((id, Err(e))) => match slots.get(&id) {
                    Some(&(_, agent)) => {
                        warn!(agent = %agent, error = %e, "Agent failed");
                        (id, Err(failure(agent, &e)))
                    }
                    None => continue,
                },
                Err(e) => match slots.get(&e.id()) {
                    Some(&(_, agent)) => {
                        error!(agent = %agent, error = %e, "Agent task panicked");
                        (
                            e.id(),
                            Err(AgentFailure {
                                agent,
                                error: format!("Agent task panicked: {e}"),
                            }),
                        )
                    }
                    None => continue,
                },
            };
            if let Some(&(index, _)) = slots.get(&id) {
                outcomes[index] = Some(outcome);
            }
        }

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(result) => results.push(result),
                Err(f) => failures.push(f),
            }
        }

        (results, failures)
    }
}

fn previous_analysis(result: &AgentResult) -> PreviousAnalysis {
    PreviousAnalysis {
        agent: result.agent,
        analysis: result.analysis.clone(),
    }
}

fn failure(agent: AgentType, error: &AgentError) -> AgentFailure {
    AgentFailure {
        agent,
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_dedupes_and_pulls_out_primary() {
        let plan = OrchestrationPlan::new(
            &[
                AgentType::TechnicalAnalyst,
                AgentType::PortfolioManager,
                AgentType::SentimentAnalyst,
                AgentType::TechnicalAnalyst,
            ],
            Some(AgentType::PortfolioManager),
            false,
            "NVDA",
            "3mo",
            LlmProvider::Gemini,
        );

        assert_eq!(
            plan.agents,
            vec![AgentType::TechnicalAnalyst, AgentType::SentimentAnalyst]
        );
        assert_eq!(plan.primary, Some(AgentType::PortfolioManager));
        assert_eq!(plan.mode, ExecutionMode::Parallel);
        assert_eq!(plan.ctx.ticker, "NVDA");
    }

    #[test]
    fn plan_mode_follows_sequential_flag() {
        let plan = OrchestrationPlan::new(
            &[AgentType::RiskManager],
            None,
            true,
            "AAPL",
            "1mo",
            LlmProvider::OpenAi,
        );
        assert_eq!(plan.mode, ExecutionMode::Sequential);
        assert_eq!(plan.agents, vec![AgentType::RiskManager]);
    }
}
