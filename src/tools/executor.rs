//! 工具执行器
//!
//! 持有 ToolRegistry 与全局超时，execute(tool_name, input) 在独立任务中调用工具（panic 也会被捕获），
//! 超时或失败时转为 AgentError；每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::AgentError;
use crate::tools::ToolRegistry;

/// 工具执行器：对每次调用施加超时，并将结果映射为 AgentError
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 没有任何工具的执行器：所有动作请求都会被视为未注册工具
    pub fn empty() -> Self {
        Self::new(ToolRegistry::new(), 30)
    }

    /// 执行指定工具；未注册返回 HallucinatedTool，超时返回 ToolTimeout，
    /// 工具返回 Err 或 panic 则转为 ToolExecutionFailed
    pub async fn execute(&self, tool_name: &str, input: &str) -> Result<String, AgentError> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| AgentError::HallucinatedTool(tool_name.to_string()))?;

        let start = Instant::now();
        let owned_input = input.to_string();
        let mut handle = tokio::spawn(async move { tool.execute(&owned_input).await });

        let mapped = match timeout(self.timeout, &mut handle).await {
            Ok(Ok(Ok(content))) => Ok(content),
            Ok(Ok(Err(e))) => Err(AgentError::ToolExecutionFailed(e)),
            Ok(Err(join_err)) => Err(AgentError::ToolExecutionFailed(format!(
                "tool panicked: {}",
                join_err
            ))),
            Err(_) => {
                // 超时后取消任务，工具不得在报告超时之后再产生副作用
                handle.abort();
                Err(AgentError::ToolTimeout(tool_name.to_string()))
            }
        };

        let outcome = match &mapped {
            Ok(_) => "ok",
            Err(AgentError::ToolTimeout(_)) => "timeout",
            Err(_) => "error",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": mapped.is_ok(),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "input_preview": input_preview(input),
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        mapped
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.registry.tool_descriptions()
    }
}

fn input_preview(input: &str) -> String {
    if input.chars().count() > 200 {
        format!("{}...", input.chars().take(200).collect::<String>())
    } else {
        input.to_string()
    }
}
