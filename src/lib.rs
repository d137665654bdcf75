//! Hive - 多角色智能体编排（Planner / Executor / Critic + 向量长期记忆）
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、步骤状态、编排器与构建器
//! - **llm**: 推理服务客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）、嵌入函数
//! - **memory**: 向量索引与长期记忆存储
//! - **observability**: 日志初始化
//! - **react**: Planner、Executor Loop、Critic、单智能体工具循环
//! - **tools**: 工具箱（calculator、word_count）与执行器

pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod tools;

pub use crate::core::{AgentError, Orchestrator, OrchestratorBuilder, RunReport};
