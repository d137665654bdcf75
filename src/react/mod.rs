//! 认知层：Planner、Executor Loop、Critic、动作解析、过程事件、单智能体工具循环

pub mod action;
pub mod critic;
pub mod events;
pub mod loop_;
pub mod planner;
pub mod solo;

pub use action::{parse_agent_output, AgentAction};
pub use critic::{parse_critique, Critic, CriticResult};
pub use events::RunEvent;
pub use loop_::StepExecutor;
pub use planner::{parse_steps, Planner};
pub use solo::SoloAgent;
