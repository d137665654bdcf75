//! 编排过程事件：用于进度展示（CLI / 日志 / 前端）

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// 单次运行中的过程事件（可序列化为 JSON）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// 规划前检索到的长期记忆
    MemoryRecall { memories: Vec<String> },
    /// 解析出的计划
    Planned { steps: Vec<String> },
    StepStarted { index: usize, step: String },
    /// 第 attempt 次尝试（从 1 开始）
    Attempt {
        index: usize,
        attempt: usize,
        max_attempts: usize,
    },
    /// Executor 原始回复
    ExecutorOutput { index: usize, text: String },
    ToolCall {
        index: usize,
        tool: String,
        input: String,
    },
    /// 追加到 AttemptState 的观察
    Observation { index: usize, text: String },
    Critique {
        index: usize,
        passed: bool,
        text: String,
    },
    StepResolved { index: usize, answer: String },
    StepFailed { index: usize, attempts: usize },
    MemoryStored { topic: String, content: String },
}

/// 可选事件通道；接收端关闭时静默丢弃
pub(crate) fn send_event(tx: Option<&UnboundedSender<RunEvent>>, ev: RunEvent) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}
