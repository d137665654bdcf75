//! Critic：评估候选答案是否满足目标与当前步骤
//!
//! 只做一次 LLM 调用，完全信任其判断：回复匹配 PASS 即通过，否则整段回复作为问题描述
//! （不拆分条目）喂回下一次尝试。宽松程度由角色指令决定，Critic 本身不做独立校验。
//!
//! PASS 的匹配方式可配置：Exact（去空白后等于 PASS）或 Prefix（去空白后以 PASS 开头）。

use std::sync::Arc;

use crate::config::PassMatch;
use crate::core::AgentError;
use crate::llm::LlmClient;

pub const PASS_TOKEN: &str = "PASS";

pub const DEFAULT_CRITIC_PROMPT: &str = "You are a critic agent.

You will receive GOAL, one of the STEPs of the overall goal and ANSWER.

Be lenient. Only critique if the answer is:
- Completely irrelevant to the goal
- Answering a different step than the one provided
- Missing key information
- Factually incorrect

Do NOT rewrite the answer.
Do NOT suggest tools unless the goal explicitly needs them.

Respond ONLY with:
PASS
or
CRITIQUE:
- issue";

/// Critic 评估结果
#[derive(Debug, Clone, PartialEq)]
pub enum CriticResult {
    Pass,
    /// 整段回复原文
    Critique(String),
}

impl CriticResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, CriticResult::Pass)
    }
}

/// 按匹配方式解析 Critic 回复
pub fn parse_critique(response: &str, mode: PassMatch) -> CriticResult {
    let trimmed = response.trim();
    let passed = match mode {
        PassMatch::Exact => trimmed == PASS_TOKEN,
        PassMatch::Prefix => trimmed.starts_with(PASS_TOKEN),
    };
    if passed {
        CriticResult::Pass
    } else {
        CriticResult::Critique(trimmed.to_string())
    }
}

/// 拼 Critic 输入：GOAL / STEP / ANSWER
pub fn critic_input(goal: &str, step: &str, answer: &str) -> String {
    format!("GOAL:\n{}\n\nSTEP:\n{}\n\nANSWER:\n{}", goal, step, answer)
}

/// Critic：持有 LLM、角色指令与 PASS 匹配方式
pub struct Critic {
    llm: Arc<dyn LlmClient>,
    prompt: String,
    pass_match: PassMatch,
}

impl Critic {
    pub fn new(llm: Arc<dyn LlmClient>, prompt: impl Into<String>) -> Self {
        Self {
            llm,
            prompt: prompt.into(),
            pass_match: PassMatch::default(),
        }
    }

    pub fn with_default_prompt(llm: Arc<dyn LlmClient>) -> Self {
        Self::new(llm, DEFAULT_CRITIC_PROMPT)
    }

    pub fn with_pass_match(mut self, mode: PassMatch) -> Self {
        self.pass_match = mode;
        self
    }

    pub async fn critique(
        &self,
        goal: &str,
        step: &str,
        answer: &str,
    ) -> Result<CriticResult, AgentError> {
        let response = self
            .llm
            .generate(&self.prompt, &critic_input(goal, step, answer))
            .await
            .map_err(AgentError::LlmError)?;
        Ok(parse_critique(&response, self.pass_match))
    }
}
