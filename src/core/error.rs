//! 编排错误类型
//!
//! 循环内的大部分错误不会中止运行：Executor Loop 把它们转成 Observation 喂给下一次尝试，
//! 只有规划阶段的 LLM 调用失败会作为 Err 返回给调用方。

use thiserror::Error;

/// 编排过程中可能出现的错误（LLM、嵌入、工具、解析、配置）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// 嵌入向量维度与索引维度不一致
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("Hallucinated tool: {0}")]
    HallucinatedTool(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for AgentError {
    fn from(e: config::ConfigError) -> Self {
        AgentError::ConfigError(e.to_string())
    }
}
