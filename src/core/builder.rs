//! 编排器构建器：统一从 AppConfig 组装各角色客户端、工具、长期记忆与提示词
//!
//! 未显式注入的组件按配置创建；提示词优先读取 prompts_dir，其次 config/prompts，最后使用内置默认值。

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::config::AppConfig;
use crate::core::{AgentError, Orchestrator};
use crate::llm::{create_embedder_from_config, create_role_clients, EmbeddingProvider, RoleClients};
use crate::memory::MemoryStore;
use crate::react::critic::DEFAULT_CRITIC_PROMPT;
use crate::react::loop_::DEFAULT_EXECUTOR_PROMPT;
use crate::react::planner::DEFAULT_PLANNER_PROMPT;
use crate::react::{Critic, Planner, RunEvent, StepExecutor};
use crate::tools::{builtin_registry, ToolExecutor};

pub struct OrchestratorBuilder {
    config: AppConfig,
    clients: Option<RoleClients>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    memory: Option<Arc<MemoryStore>>,
    tools: Option<Arc<ToolExecutor>>,
    events: Option<UnboundedSender<RunEvent>>,
}

impl OrchestratorBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            clients: None,
            embedder: None,
            memory: None,
            tools: None,
            events: None,
        }
    }

    /// 注入三个角色的客户端（测试中传入 Mock）
    pub fn with_clients(mut self, clients: RoleClients) -> Self {
        self.clients = Some(clients);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// 注入已有的记忆库（不再写入种子）
    pub fn with_memory(mut self, memory: Arc<MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_tools(mut self, tools: Arc<ToolExecutor>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_events(mut self, tx: UnboundedSender<RunEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    fn prompt_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(dir) = &self.config.app.prompts_dir {
            dirs.push(dir.clone());
        }
        dirs.push(PathBuf::from("config/prompts"));
        dirs.push(PathBuf::from("../config/prompts"));
        dirs
    }

    /// 读取角色提示词文件，找不到或为空时用默认值
    pub fn load_prompt(&self, file_name: &str, default: &str) -> String {
        self.prompt_dirs()
            .into_iter()
            .find_map(|dir| std::fs::read_to_string(dir.join(file_name)).ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    /// 按 [tools].enabled 构建工具执行器
    pub fn build_tools(&self) -> Arc<ToolExecutor> {
        let registry = builtin_registry(&self.config.tools.enabled);
        Arc::new(ToolExecutor::new(registry, self.config.tools.tool_timeout_secs))
    }

    /// 创建并写入种子记忆；种子写入失败只记录警告
    pub fn build_memory(&self) -> Arc<MemoryStore> {
        let embedder = self
            .embedder
            .clone()
            .unwrap_or_else(|| create_embedder_from_config(&self.config.embedding));
        let store = Arc::new(MemoryStore::new(embedder, self.config.embedding.dimension));
        match store.seed(&self.config.memory.seeds) {
            Ok(n) => tracing::info!("Seeded long-term memory with {} entries", n),
            Err(e) => tracing::warn!("Failed to seed long-term memory: {}", e),
        }
        store
    }

    fn validate(&self) -> Result<(), AgentError> {
        if self.config.orchestrator.max_retries == 0 {
            return Err(AgentError::ConfigError(
                "orchestrator.max_retries must be at least 1".into(),
            ));
        }
        if self.config.embedding.dimension == 0 {
            return Err(AgentError::ConfigError(
                "embedding.dimension must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn build(self) -> Result<Orchestrator, AgentError> {
        self.validate()?;

        let clients = self
            .clients
            .clone()
            .unwrap_or_else(|| create_role_clients(&self.config));
        let tools = self.tools.clone().unwrap_or_else(|| self.build_tools());
        let settings = self.config.orchestrator.clone();

        let planner = Planner::new(
            clients.planner,
            self.load_prompt("planner.txt", DEFAULT_PLANNER_PROMPT),
        );
        let critic = Critic::new(
            clients.critic,
            self.load_prompt("critic.txt", DEFAULT_CRITIC_PROMPT),
        )
        .with_pass_match(settings.pass_match);
        let executor = StepExecutor::new(
            clients.executor,
            &self.load_prompt("executor.txt", DEFAULT_EXECUTOR_PROMPT),
            critic,
            tools,
        );

        let memory = if !settings.use_memory {
            None
        } else if let Some(m) = self.memory.clone() {
            Some(m)
        } else {
            Some(self.build_memory())
        };

        let mut orchestrator = Orchestrator::new(planner, executor, settings);
        if let Some(m) = memory {
            orchestrator = orchestrator.with_memory(m);
        }
        if let Some(tx) = self.events {
            orchestrator = orchestrator.with_events(tx);
        }
        Ok(orchestrator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{HashingEmbedder, MockLlmClient};

    fn mock_clients() -> RoleClients {
        RoleClients {
            planner: Arc::new(MockLlmClient::always("1. only step")),
            executor: Arc::new(MockLlmClient::always("FINAL ANSWER: done")),
            critic: Arc::new(MockLlmClient::always("PASS")),
        }
    }

    #[test]
    fn test_prompt_override_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("critic.txt"), "Custom critic").unwrap();
        let mut cfg = AppConfig::default();
        cfg.app.prompts_dir = Some(dir.path().to_path_buf());
        let builder = OrchestratorBuilder::new(cfg);
        assert_eq!(builder.load_prompt("critic.txt", "fallback"), "Custom critic");
        assert_eq!(builder.load_prompt("no_such_prompt.txt", "fallback"), "fallback");
    }

    #[test]
    fn test_zero_retries_rejected() {
        let mut cfg = AppConfig::default();
        cfg.orchestrator.max_retries = 0;
        let result = OrchestratorBuilder::new(cfg).with_clients(mock_clients()).build();
        assert!(matches!(result, Err(AgentError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_build_seeds_memory_and_runs() {
        let orch = OrchestratorBuilder::new(AppConfig::default())
            .with_clients(mock_clients())
            .with_embedder(Arc::new(HashingEmbedder::new(384)))
            .build()
            .unwrap();
        let memory = orch.memory().unwrap().clone();
        assert_eq!(memory.len(), 3);

        assert_eq!(orch.run("goal").await.unwrap(), "done");
        assert_eq!(memory.records_by_topic("learned_answer").len(), 1);
    }

    #[test]
    fn test_use_memory_false_has_no_store() {
        let mut cfg = AppConfig::default();
        cfg.orchestrator.use_memory = false;
        let orch = OrchestratorBuilder::new(cfg)
            .with_clients(mock_clients())
            .build()
            .unwrap();
        assert!(orch.memory().is_none());
    }
}
