//! 核心编排层：错误类型、步骤状态、编排器与构建器

pub mod builder;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use builder::OrchestratorBuilder;
pub use error::AgentError;
pub use orchestrator::{Orchestrator, RunReport, StepReport};
pub use state::{AttemptState, StepOutcome};
