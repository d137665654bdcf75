//! 编排器：Memory 检索 -> Planner -> 逐步 Executor Loop + Critic -> Memory 写回 -> 拼接结果
//!
//! 步骤严格串行；某一步失败只在该步位置写入失败标记，不影响后续步骤。
//! 只有规划调用失败会返回 Err，其余错误（检索、写回、执行、评估）都降级处理。

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::OrchestratorSection;
use crate::core::{AgentError, StepOutcome};
use crate::memory::MemoryStore;
use crate::react::events::{send_event, RunEvent};
use crate::react::{Planner, StepExecutor};

/// 单步报告
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: String,
    pub outcome: StepOutcome,
}

/// 一次运行的完整报告
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub goal: String,
    /// 规划前检索到的相关记忆（相似度降序）
    pub memories: Vec<String>,
    pub plan: Vec<String>,
    pub steps: Vec<StepReport>,
    pub failure_sentinel: String,
}

impl RunReport {
    /// 每步一个位置：通过的答案或失败标记，以空行连接
    pub fn output(&self) -> String {
        self.steps
            .iter()
            .map(|s| match &s.outcome {
                StepOutcome::Answered { answer, .. } => answer.as_str(),
                StepOutcome::Failed { .. } => self.failure_sentinel.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn answered_count(&self) -> usize {
        self.steps.iter().filter(|s| s.outcome.is_answered()).count()
    }
}

/// 编排器：持有 Planner、StepExecutor、可选长期记忆与运行参数
pub struct Orchestrator {
    planner: Planner,
    executor: StepExecutor,
    memory: Option<Arc<MemoryStore>>,
    settings: OrchestratorSection,
    events: Option<UnboundedSender<RunEvent>>,
}

impl Orchestrator {
    /// executor 的重试上限以 settings.max_retries 为准
    pub fn new(planner: Planner, executor: StepExecutor, settings: OrchestratorSection) -> Self {
        let executor = executor.with_max_retries(settings.max_retries);
        Self {
            planner,
            executor,
            memory: None,
            settings,
            events: None,
        }
    }

    pub fn with_memory(mut self, memory: Arc<MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_events(mut self, tx: UnboundedSender<RunEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn memory(&self) -> Option<&Arc<MemoryStore>> {
        self.memory.as_ref()
    }

    pub fn settings(&self) -> &OrchestratorSection {
        &self.settings
    }

    fn active_memory(&self) -> Option<&MemoryStore> {
        if self.settings.use_memory {
            self.memory.as_deref()
        } else {
            None
        }
    }

    fn recall(&self, goal: &str) -> Vec<String> {
        let Some(memory) = self.active_memory() else {
            return Vec::new();
        };
        match memory.retrieve(goal, self.settings.top_k, self.settings.relevance_threshold) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("memory retrieval failed, planning without context: {}", e);
                Vec::new()
            }
        }
    }

    fn remember(&self, answer: &str) {
        if !self.settings.store_answers {
            return;
        }
        let Some(memory) = self.active_memory() else {
            return;
        };
        let topic = &self.settings.learned_topic;
        match memory.insert(answer, topic) {
            Ok(()) => send_event(
                self.events.as_ref(),
                RunEvent::MemoryStored {
                    topic: topic.clone(),
                    content: answer.to_string(),
                },
            ),
            Err(e) => tracing::warn!("failed to store answer in memory: {}", e),
        }
    }

    /// 运行并返回完整报告
    pub async fn run_detailed(&self, goal: &str) -> Result<RunReport, AgentError> {
        let events = self.events.as_ref();
        tracing::info!(
            goal,
            max_retries = self.executor.max_retries(),
            "orchestration started"
        );

        let memories = self.recall(goal);
        tracing::info!(count = memories.len(), "relevant memories recalled");
        send_event(
            events,
            RunEvent::MemoryRecall {
                memories: memories.clone(),
            },
        );

        let plan = self.planner.plan(goal, &memories.join("\n")).await?;
        tracing::info!(steps = plan.len(), "plan parsed");
        send_event(
            events,
            RunEvent::Planned {
                steps: plan.clone(),
            },
        );

        let mut steps = Vec::with_capacity(plan.len());
        for (index, step) in plan.iter().enumerate() {
            send_event(
                events,
                RunEvent::StepStarted {
                    index,
                    step: step.clone(),
                },
            );
            let outcome = self.executor.execute(index, goal, step, events).await;
            match &outcome {
                StepOutcome::Answered { answer, .. } => {
                    send_event(
                        events,
                        RunEvent::StepResolved {
                            index,
                            answer: answer.clone(),
                        },
                    );
                    self.remember(answer);
                }
                StepOutcome::Failed { attempts, .. } => {
                    send_event(
                        events,
                        RunEvent::StepFailed {
                            index,
                            attempts: *attempts,
                        },
                    );
                }
            }
            steps.push(StepReport {
                step: step.clone(),
                outcome,
            });
        }

        let report = RunReport {
            goal: goal.to_string(),
            memories,
            plan,
            steps,
            failure_sentinel: self.settings.failure_sentinel.clone(),
        };
        tracing::info!(
            answered = report.answered_count(),
            total = report.steps.len(),
            "orchestration finished"
        );
        Ok(report)
    }

    /// 运行并返回拼接后的输出
    pub async fn run(&self, goal: &str) -> Result<String, AgentError> {
        Ok(self.run_detailed(goal).await?.output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FailingLlmClient, HashingEmbedder, MockLlmClient};
    use crate::react::Critic;
    use crate::tools::ToolExecutor;

    fn orchestrator(
        planner: Arc<dyn crate::llm::LlmClient>,
        exec: Arc<MockLlmClient>,
        critic: Arc<MockLlmClient>,
    ) -> Orchestrator {
        let executor = StepExecutor::with_default_prompt(
            exec,
            Critic::with_default_prompt(critic),
            Arc::new(ToolExecutor::empty()),
        );
        Orchestrator::new(
            Planner::with_default_prompt(planner),
            executor,
            OrchestratorSection::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_plan_gives_empty_output() {
        let orch = orchestrator(
            Arc::new(MockLlmClient::always("I cannot plan this.")),
            Arc::new(MockLlmClient::new()),
            Arc::new(MockLlmClient::always("PASS")),
        );
        let report = orch.run_detailed("goal").await.unwrap();
        assert!(report.plan.is_empty());
        assert_eq!(report.output(), "");
    }

    #[tokio::test]
    async fn test_planner_failure_is_error() {
        let orch = orchestrator(
            Arc::new(FailingLlmClient),
            Arc::new(MockLlmClient::new()),
            Arc::new(MockLlmClient::always("PASS")),
        );
        assert!(matches!(
            orch.run("goal").await,
            Err(AgentError::LlmError(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_step_does_not_stop_later_steps() {
        let exec = Arc::new(MockLlmClient::scripted([
            "FINAL ANSWER: a1",
            "FINAL ANSWER: bad",
            "FINAL ANSWER: bad",
            "FINAL ANSWER: bad",
            "FINAL ANSWER: c1",
        ]));
        let critic = Arc::new(MockLlmClient::scripted([
            "PASS",
            "CRITIQUE:\n- no",
            "CRITIQUE:\n- no",
            "CRITIQUE:\n- no",
            "PASS",
        ]));
        let orch = orchestrator(
            Arc::new(MockLlmClient::always("1. a\n2. b\n3. c")),
            exec,
            critic,
        );
        let out = orch.run("goal").await.unwrap();
        assert_eq!(out, "a1\n\n❌ Step failed after retries.\n\nc1");
    }

    #[tokio::test]
    async fn test_use_memory_false_skips_store() {
        let memory = Arc::new(MemoryStore::new(Arc::new(HashingEmbedder::new(64)), 64));
        let mut orch = orchestrator(
            Arc::new(MockLlmClient::always("1. a")),
            Arc::new(MockLlmClient::always("FINAL ANSWER: x")),
            Arc::new(MockLlmClient::always("PASS")),
        )
        .with_memory(memory.clone());
        orch.settings.use_memory = false;
        orch.run("goal").await.unwrap();
        assert!(memory.is_empty());
    }

    #[test]
    fn test_settings_override_executor_retries() {
        let settings = OrchestratorSection {
            max_retries: 5,
            ..OrchestratorSection::default()
        };
        let executor = StepExecutor::with_default_prompt(
            Arc::new(MockLlmClient::new()),
            Critic::with_default_prompt(Arc::new(MockLlmClient::always("PASS"))),
            Arc::new(ToolExecutor::empty()),
        );
        let orch = Orchestrator::new(
            Planner::with_default_prompt(Arc::new(MockLlmClient::new())),
            executor,
            settings,
        );
        assert_eq!(orch.executor.max_retries(), 5);
    }
}
