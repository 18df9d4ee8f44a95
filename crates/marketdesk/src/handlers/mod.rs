pub mod agents;
pub mod llm;
pub mod market;
pub mod system;

pub use agents::*;
pub use llm::*;
pub use market::*;
pub use system::*;
