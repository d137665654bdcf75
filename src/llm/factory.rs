//! 按角色创建 LLM 客户端（DeepSeek / OpenAI 兼容 / Mock）
//!
//! 每个角色（planner / executor / critic）拿到独立的 `Arc<dyn LlmClient>`，模型可分别配置。
//! 没有任何 API Key 时回落到脚本化 Mock，保证本地可以跑通整条链路。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 编排中的三个角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Planner,
    Executor,
    Critic,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Planner => "planner",
            AgentRole::Executor => "executor",
            AgentRole::Critic => "critic",
        }
    }

    /// Mock 模式下该角色的固定回复
    fn mock_reply(&self) -> &'static str {
        match self {
            AgentRole::Planner => "1. Restate the goal\n2. Answer the goal",
            AgentRole::Executor => "FINAL ANSWER: Mock answer",
            AgentRole::Critic => "PASS",
        }
    }
}

/// 三个角色的客户端句柄
#[derive(Clone)]
pub struct RoleClients {
    pub planner: Arc<dyn LlmClient>,
    pub executor: Arc<dyn LlmClient>,
    pub critic: Arc<dyn LlmClient>,
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|k| !k.is_empty())
}

/// DeepSeek 走 OpenAI 兼容协议，仅 base_url 不同
pub fn create_deepseek_client(base_url: Option<&str>, model: &str, api_key: &str) -> OpenAiClient {
    OpenAiClient::new(Some(base_url.unwrap_or(DEEPSEEK_BASE_URL)), model, Some(api_key))
}

/// 为单个角色创建客户端：DEEPSEEK_API_KEY（或 provider=deepseek 且仅有 OPENAI_API_KEY）走 DeepSeek，
/// OPENAI_API_KEY 走 OpenAI 兼容端点，其余情况用 Mock
pub fn create_llm_for_role(cfg: &AppConfig, role: AgentRole) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let role_model = match role {
        AgentRole::Planner => cfg.llm.planner_model.clone(),
        AgentRole::Executor => cfg.llm.executor_model.clone(),
        AgentRole::Critic => cfg.llm.critic_model.clone(),
    };
    let model = role_model.unwrap_or_else(|| cfg.llm.model.clone());

    if provider == "mock" {
        return Arc::new(MockLlmClient::always(role.mock_reply()));
    }

    let deepseek_key = env_key("DEEPSEEK_API_KEY")
        .or_else(|| (provider == "deepseek").then(|| env_key("OPENAI_API_KEY")).flatten());
    if let Some(key) = deepseek_key {
        tracing::info!(role = role.as_str(), "Using DeepSeek LLM ({})", model);
        return Arc::new(create_deepseek_client(cfg.llm.base_url.as_deref(), &model, &key));
    }

    if let Some(key) = env_key("OPENAI_API_KEY") {
        tracing::info!(role = role.as_str(), "Using OpenAI LLM ({})", model);
        return Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &model,
            Some(&key),
        ));
    }

    tracing::warn!(role = role.as_str(), "No API key set, using Mock LLM");
    Arc::new(MockLlmClient::always(role.mock_reply()))
}

pub fn create_role_clients(cfg: &AppConfig) -> RoleClients {
    RoleClients {
        planner: create_llm_for_role(cfg, AgentRole::Planner),
        executor: create_llm_for_role(cfg, AgentRole::Executor),
        critic: create_llm_for_role(cfg, AgentRole::Critic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_gives_role_replies() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".to_string();
        let clients = create_role_clients(&cfg);
        assert_eq!(clients.critic.generate("", "").await.unwrap(), "PASS");
        assert!(clients
            .executor
            .generate("", "")
            .await
            .unwrap()
            .starts_with("FINAL ANSWER"));
        assert!(clients.planner.generate("", "").await.unwrap().starts_with("1."));
    }
}
