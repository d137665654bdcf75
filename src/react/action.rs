//! Executor 输出解析：把 LLM 原始文本解码为 AgentAction
//!
//! 优先级：
//! 1. 以 `FINAL ANSWER` 开头（区分大小写）-> FinalAnswer（去掉标记与紧随的冒号）
//! 2. 以 `{` 开头或为 ```json 代码块 -> 解析 `{"action": ..., "input": ...}`，失败为 Malformed
//! 3. 其它 -> Unparsable

use serde::Deserialize;
use serde_json::Value;

use crate::core::AgentError;

pub const FINAL_ANSWER_MARKER: &str = "FINAL ANSWER";

/// Executor 单次回复的分类
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    FinalAnswer(String),
    ToolRequest { name: String, input: String },
    /// 看起来是动作请求，但 JSON 无法解析或缺字段
    Malformed { raw: String, error: String },
    /// 既无标记也不是动作请求
    Unparsable(String),
}

#[derive(Debug, Deserialize)]
struct ActionRequest {
    action: String,
    input: Value,
}

/// 从 ```json ... ``` 代码块或裸 JSON 中取出 JSON 文本
fn extract_json(trimmed: &str) -> Option<&str> {
    if let Some(rest) = trimmed.strip_prefix("```json") {
        let body = rest.find("```").map(|end| &rest[..end]).unwrap_or(rest);
        return Some(body.trim());
    }
    if trimmed.starts_with('{') {
        return Some(trimmed);
    }
    None
}

fn input_to_string(input: Value) -> String {
    match input {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// 解析 Executor 回复
pub fn parse_agent_output(output: &str) -> AgentAction {
    let trimmed = output.trim();

    if let Some(rest) = trimmed.strip_prefix(FINAL_ANSWER_MARKER) {
        let answer = rest.trim_start();
        let answer = answer.strip_prefix(':').unwrap_or(answer);
        return AgentAction::FinalAnswer(answer.trim().to_string());
    }

    let Some(json_str) = extract_json(trimmed) else {
        return AgentAction::Unparsable(trimmed.to_string());
    };

    match serde_json::from_str::<ActionRequest>(json_str) {
        Ok(req) if !req.action.trim().is_empty() => AgentAction::ToolRequest {
            name: req.action.trim().to_string(),
            input: input_to_string(req.input),
        },
        Ok(_) => AgentAction::Malformed {
            raw: trimmed.to_string(),
            error: "\"action\" must name a tool".to_string(),
        },
        Err(e) => AgentAction::Malformed {
            raw: trimmed.to_string(),
            error: AgentError::JsonParseError(e.to_string()).to_string(),
        },
    }
}
