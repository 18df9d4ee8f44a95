//! Orchestration scenarios against a mock LLM and fixed market data.

use std::sync::Arc;
use std::time::Duration;

use marketdesk_agents::test_support::MockLlm;
use marketdesk_agents::{AgentError, AgentRunner, AgentSettings, OrchestrationPlan, Orchestrator};
use marketdesk_market::test_support::{FailingProvider, FixedNewsProvider, FixedProvider};
use marketdesk_market::{MarketData, NewsService};
use marketdesk_models::agent_message::{AgentType, ExecutionMode, LlmProvider};
use marketdesk_models::config::LlmConfig;
use marketdesk_models::market::DataSource;

fn orchestrator(llm: MockLlm) -> Orchestrator {
    let runner = AgentRunner::new(
        Arc::new(llm),
        Arc::new(MarketData::new(Arc::new(FixedProvider::default()), None)),
        Arc::new(NewsService::new(Some(Arc::new(FixedNewsProvider)), 5)),
        AgentSettings::from(&LlmConfig::default()),
    );
    Orchestrator::new(Arc::new(runner))
}

fn plan(agents: &[AgentType], primary: Option<AgentType>, sequential: bool) -> OrchestrationPlan {
    OrchestrationPlan::new(agents, primary, sequential, "AAPL", "1mo", LlmProvider::Gemini)
}

fn saw_previous(value: &serde_json::Value) -> Vec<String> {
    value["sawPrevious"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn single_agent_parallel_wraps_single_result() {
    let result = orchestrator(MockLlm::new())
        .run(&plan(&[AgentType::TechnicalAnalyst], None, false))
        .await
        .unwrap();

    assert_eq!(result.mode, ExecutionMode::Parallel);
    assert_eq!(result.agents, vec![AgentType::TechnicalAnalyst]);
    assert_eq!(result.results.len(), 1);
    assert!(result.failures.is_empty());
    assert!(result.primary.is_none());

    let single = &result.results[0];
    assert_eq!(single.agent, AgentType::TechnicalAnalyst);
    assert_eq!(single.ticker, "AAPL");
    assert_eq!(single.data_source, DataSource::Api);
}

#[tokio::test]
async fn parallel_agents_do_not_see_each_other() {
    let result = orchestrator(MockLlm::new())
        .run(&plan(
            &[
                AgentType::TechnicalAnalyst,
                AgentType::SentimentAnalyst,
                AgentType::OptionsAnalyst,
            ],
            None,
            false,
        ))
        .await
        .unwrap();

    let order: Vec<AgentType> = result.results.iter().map(|r| r.agent).collect();
    assert_eq!(
        order,
        vec![
            AgentType::TechnicalAnalyst,
            AgentType::SentimentAnalyst,
            AgentType::OptionsAnalyst
        ]
    );
    for r in &result.results {
        assert!(saw_previous(&r.analysis).is_empty());
    }
}

#[tokio::test]
async fn sequential_agents_see_earlier_analyses() {
    let result = orchestrator(MockLlm::new())
        .run(&plan(
            &[
                AgentType::TechnicalAnalyst,
                AgentType::FundamentalAnalyst,
                AgentType::RiskManager,
            ],
            None,
            true,
        ))
        .await
        .unwrap();

    assert_eq!(result.mode, ExecutionMode::Sequential);
    assert!(saw_previous(&result.results[0].analysis).is_empty());
    assert_eq!(
        saw_previous(&result.results[1].analysis),
        vec!["technical-analyst"]
    );
    assert_eq!(
        saw_previous(&result.results[2].analysis),
        vec!["technical-analyst", "fundamental-analyst"]
    );
}

#[tokio::test]
async fn primary_agent_runs_last_with_every_analysis() {
    let result = orchestrator(MockLlm::new())
        .run(&plan(
            &[
                AgentType::PortfolioManager,
                AgentType::TechnicalAnalyst,
                AgentType::SentimentAnalyst,
            ],
            Some(AgentType::PortfolioManager),
            false,
        ))
        .await
        .unwrap();

    assert_eq!(
        result.agents,
        vec![AgentType::TechnicalAnalyst, AgentType::SentimentAnalyst]
    );
    let primary = result.primary.unwrap();
    assert_eq!(primary.agent, AgentType::PortfolioManager);
    assert_eq!(
        saw_previous(&primary.analysis),
        vec!["technical-analyst", "sentiment-analyst"]
    );
}

#[tokio::test]
async fn failed_agent_does_not_abort_the_rest() {
    let llm = MockLlm::new().failing_for(AgentType::SentimentAnalyst);
    let result = orchestrator(llm)
        .run(&plan(
            &[AgentType::TechnicalAnalyst, AgentType::SentimentAnalyst],
            None,
            true,
        ))
        .await
        .unwrap();

    assert_eq!(result.results.len(), 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].agent, AgentType::SentimentAnalyst);
    assert!(result.failures[0].error.contains("503"));
}

#[tokio::test]
async fn panicking_agent_is_reported_as_failure() {
    let llm = MockLlm::new().panicking_for(AgentType::OptionsAnalyst);
    let result = orchestrator(llm)
        .run(&plan(
            &[AgentType::OptionsAnalyst, AgentType::RiskManager],
            None,
            false,
        ))
        .await
        .unwrap();

    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].agent, AgentType::RiskManager);
    assert_eq!(result.failures[0].agent, AgentType::OptionsAnalyst);
    assert!(result.failures[0].error.contains("panicked"));
}

#[tokio::test]
async fn every_agent_failing_is_an_error() {
    let llm = MockLlm::new()
        .failing_for(AgentType::TechnicalAnalyst)
        .failing_for(AgentType::PortfolioManager);
    let err = orchestrator(llm)
        .run(&plan(
            &[AgentType::TechnicalAnalyst],
            Some(AgentType::PortfolioManager),
            false,
        ))
        .await
        .unwrap_err();

    match err {
        AgentError::AllAgentsFailed(details) => {
            assert!(details.contains("technical-analyst"));
            assert!(details.contains("portfolio-manager"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn mock_market_data_is_flagged_on_results() {
    let runner = AgentRunner::new(
        Arc::new(MockLlm::new()),
        Arc::new(MarketData::new(Arc::new(FailingProvider), None)),
        Arc::new(NewsService::new(None, 5)),
        AgentSettings::from(&LlmConfig::default()),
    );
    let result = Orchestrator::new(Arc::new(runner))
        .run(&plan(&[AgentType::TechnicalAnalyst], None, false))
        .await
        .unwrap();

    assert_eq!(result.results[0].data_source, DataSource::Mock);
}

#[tokio::test]
async fn dropping_parallel_run_aborts_in_flight_agents() {
    let llm = Arc::new(MockLlm::new().with_delay(Duration::from_millis(300)));
    let runner = AgentRunner::new(
        llm.clone(),
        Arc::new(MarketData::new(Arc::new(FixedProvider::default()), None)),
        Arc::new(NewsService::new(Some(Arc::new(FixedNewsProvider)), 5)),
        AgentSettings::from(&LlmConfig::default()),
    );
    let orchestrator = Orchestrator::new(Arc::new(runner));
    let plan = plan(
        &[AgentType::TechnicalAnalyst, AgentType::SentimentAnalyst],
        None,
        false,
    );

    let timed_out = tokio::time::timeout(Duration::from_millis(50), orchestrator.run(&plan)).await;
    assert!(timed_out.is_err());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(llm.completed(), 0);
}
