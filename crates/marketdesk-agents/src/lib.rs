pub mod agent;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod parser;
pub mod prepare;
pub mod prompts;

pub mod test_support;

pub use agent::{AgentRunner, AgentSettings, RunContext};
pub use error::AgentError;
pub use llm::{HttpLlmClient, LlmClient, LlmRequest, ModelFamily, ResponseFormat};
pub use orchestrator::{OrchestrationPlan, Orchestrator};
pub use prepare::{prepare_agent_request, PreparedRequest};
