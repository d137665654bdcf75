//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `HIVE__*` 覆盖（双下划线表示嵌套，如 `HIVE__ORCHESTRATOR__MAX_RETRIES=5`）。
//! 所有键都有默认值，缺省文件时即为参考配置（MAX_RETRIES=3, TOP_K=3, RELEVANCE_THRESHOLD=0.55）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub embedding: EmbeddingSection,
    pub orchestrator: OrchestratorSection,
    pub tools: ToolsSection,
    pub memory: MemorySection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 角色提示词目录（planner.txt / executor.txt / critic.txt），未设置时查找 config/prompts
    pub prompts_dir: Option<PathBuf>,
}

/// [llm] 段：后端选择与各角色模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：deepseek / openai / mock；无 API Key 时一律回落到 mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub planner_model: Option<String>,
    pub executor_model: Option<String>,
    pub critic_model: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            model: "deepseek-chat".to_string(),
            base_url: None,
            planner_model: None,
            executor_model: None,
            critic_model: None,
        }
    }
}

/// [embedding] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub enabled: bool,
    pub model: String,
    pub base_url: Option<String>,
    /// 向量维度 D
    pub dimension: usize,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "text-embedding-3-small".to_string(),
            base_url: None,
            dimension: 384,
        }
    }
}

/// Critic 回复与 PASS 的匹配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PassMatch {
    /// 去掉首尾空白后恰好等于 PASS
    #[default]
    Exact,
    /// 去掉首尾空白后以 PASS 开头
    Prefix,
}

/// [orchestrator] 段：重试上限、检索参数、写回策略
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorSection {
    pub max_retries: usize,
    pub top_k: usize,
    pub relevance_threshold: f32,
    pub use_memory: bool,
    pub store_answers: bool,
    pub learned_topic: String,
    pub pass_match: PassMatch,
    pub failure_sentinel: String,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            max_retries: 3,
            top_k: 3,
            relevance_threshold: 0.55,
            use_memory: true,
            store_answers: true,
            learned_topic: "learned_answer".to_string(),
            pass_match: PassMatch::Exact,
            failure_sentinel: "❌ Step failed after retries.".to_string(),
        }
    }
}

/// [tools] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// 启用的内置工具名
    pub enabled: Vec<String>,
    /// 单次工具调用超时（秒）
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            enabled: vec!["calculator".into(), "word_count".into()],
            tool_timeout_secs: 30,
        }
    }
}

/// 一条种子记忆
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeedMemory {
    pub content: String,
    #[serde(default = "default_seed_topic")]
    pub topic: String,
}

fn default_seed_topic() -> String {
    "general".to_string()
}

/// [memory] 段：启动时写入的种子知识
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    pub seeds: Vec<SeedMemory>,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            seeds: vec![
                SeedMemory {
                    content: "Agentic AI systems rely on orchestration logic to manage planning, execution, retries, and role separation.".into(),
                    topic: "agentic_ai".into(),
                },
                SeedMemory {
                    content: "Critic agents should evaluate output without rewriting it to avoid role leakage.".into(),
                    topic: "agent_design".into(),
                },
                SeedMemory {
                    content: "Vector databases enable efficient similarity search for unstructured data, which is crucial for AI applications like recommendation systems and semantic search.".into(),
                    topic: "vector_databases".into(),
                },
            ],
        }
    }
}

/// 从 config 目录加载配置，环境变量 HIVE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 HIVE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("HIVE")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
