//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient::complete；
//! generate(role_instruction, input) 是各角色（Planner / Executor / Critic）实际使用的无状态调用。

use async_trait::async_trait;

use crate::memory::Message;

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;

    /// 以 system(role_instruction) + user(input) 调用一次
    async fn generate(&self, role_instruction: &str, input: &str) -> Result<String, String> {
        let messages = [Message::system(role_instruction), Message::user(input)];
        self.complete(&messages).await
    }

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
