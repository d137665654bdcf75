//! 动作请求 JSON Schema 生成
//!
//! 用于将「合法动作请求」的 JSON 结构注入 Executor 的 system prompt，减少 LLM 输出格式错误。

use schemars::{schema_for, JsonSchema};

/// 动作请求格式：与 Executor Loop 解析的 `{"action": "...", "input": "..."}` 一致（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
struct ActionRequestFormat {
    /// 工具名，如 calculator、word_count
    pub action: String,
    /// 工具输入
    pub input: String,
}

/// 返回动作请求的 JSON Schema 字符串，可拼入 system prompt
pub fn action_request_schema_json() -> String {
    let schema = schema_for!(ActionRequestFormat);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names_both_fields() {
        let schema = action_request_schema_json();
        assert!(schema.contains("\"action\""));
        assert!(schema.contains("\"input\""));
    }
}
