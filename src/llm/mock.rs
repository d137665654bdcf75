//! Mock LLM 客户端（用于测试与无 API Key 的本地运行）
//!
//! 按顺序返回预设回复；预设用完后重复最后一条（未设置任何回复时返回固定的 FINAL ANSWER）。
//! 记录每次调用的 system / user 内容，便于断言调用次数与输入。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};

/// 一次调用的记录
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub input: String,
}

/// 脚本化 Mock 客户端
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按顺序返回给定回复
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// 每次都返回同一条回复
    pub fn always(reply: impl Into<String>) -> Self {
        Self::scripted([reply.into()])
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn next_reply(&self) -> String {
        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                reply
            }
            None => last
                .clone()
                .unwrap_or_else(|| "FINAL ANSWER: Mock answer".to_string()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let pick = |role: Role| {
            messages
                .iter()
                .rev()
                .find(|m| m.role == role)
                .map(|m| m.content.clone())
                .unwrap_or_default()
        };
        let call = RecordedCall {
            system: pick(Role::System),
            input: pick(Role::User),
        };
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        Ok(self.next_reply())
    }
}

/// 总是失败的客户端，用于验证传输错误的降级路径
#[derive(Debug, Default)]
pub struct FailingLlmClient;

#[async_trait]
impl LlmClient for FailingLlmClient {
    async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
        Err("connection refused".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_then_repeat_last() {
        let llm = MockLlmClient::scripted(["a", "b"]);
        assert_eq!(llm.generate("sys", "1").await.unwrap(), "a");
        assert_eq!(llm.generate("sys", "2").await.unwrap(), "b");
        assert_eq!(llm.generate("sys", "3").await.unwrap(), "b");
        assert_eq!(llm.call_count(), 3);
        let calls = llm.calls();
        assert_eq!(calls[0].system, "sys");
        assert_eq!(calls[2].input, "3");
    }

    #[tokio::test]
    async fn test_default_reply() {
        let llm = MockLlmClient::new();
        let out = llm.generate("sys", "hi").await.unwrap();
        assert!(out.starts_with("FINAL ANSWER"));
    }
}
