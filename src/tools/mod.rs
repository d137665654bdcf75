//! 工具箱：Tool trait、注册表、带超时的执行器与内置工具（calculator / word_count）

pub mod calculator;
pub mod executor;
pub mod registry;
pub mod schema;
pub mod word_count;

pub use calculator::CalculatorTool;
pub use executor::ToolExecutor;
pub use registry::{Tool, ToolRegistry};
pub use schema::action_request_schema_json;
pub use word_count::WordCountTool;

/// 按名称构建内置工具注册表；未知名称记录警告并跳过
pub fn builtin_registry(enabled: &[String]) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for name in enabled {
        match name.as_str() {
            "calculator" => registry.register(CalculatorTool),
            "word_count" => registry.register(WordCountTool),
            other => tracing::warn!("Unknown builtin tool '{}' in config, skipped", other),
        }
    }
    registry
}
