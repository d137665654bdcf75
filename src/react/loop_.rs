//! Executor Loop：单个步骤的有界尝试循环
//!
//! 每次尝试 = 一次 Executor 调用（输入为 GOAL / STEP / 当前全部观察）：
//! - FINAL ANSWER -> 交给 Critic；PASS 则步骤完成，否则整段 critique 作为观察
//! - 动作请求 -> 已注册工具则执行，结果以 `Tool result: ...` 追加；未注册则列出可用工具
//! - 动作 JSON 无法解析 -> 追加格式错误说明
//! - 其它 -> 追加「未给出 FINAL ANSWER」的纠正提示
//!
//! 不论哪种分支都消耗一次尝试，共 max_retries 次；用尽仍未 PASS 则返回 Failed。
//! 工具与 LLM 的错误都转为观察，不会向上传播。

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::core::{AttemptState, StepOutcome};
use crate::llm::LlmClient;
use crate::react::action::{parse_agent_output, AgentAction};
use crate::react::events::{send_event, RunEvent};
use crate::react::{Critic, CriticResult};
use crate::tools::{action_request_schema_json, ToolExecutor};

pub const DEFAULT_MAX_RETRIES: usize = 3;

pub const DEFAULT_EXECUTOR_PROMPT: &str = "You are an execution agent.

You will receive:
- GOAL
- STEP
- OBSERVATIONS

Rules:
- Execute ONLY the given step
- Use OBSERVATIONS only as feedback, not as a new task
- Keep your answer SHORT (1-2 sentences max)
- If an error occurred previously, re-evaluate calmly

Available tools:
{tools}

When you need a tool, respond EXACTLY with one JSON object matching this schema:
{schema}
Example: {\"action\": \"calculator\", \"input\": \"2+2\"}

Otherwise answer directly with:
FINAL ANSWER: <answer>";

pub const RETRY_WITH_CLARITY: &str = "Executor did not provide FINAL ANSWER. Retry with clarity.";

/// 把工具列表与动作 Schema 填入 Executor 角色指令
pub fn render_executor_prompt(template: &str, tools: &ToolExecutor) -> String {
    let descriptions = tools.tool_descriptions();
    let tool_block = if descriptions.is_empty() {
        "(none)".to_string()
    } else {
        descriptions
            .iter()
            .map(|(name, desc)| format!("- {}: {}", name, desc))
            .collect::<Vec<_>>()
            .join("\n")
    };
    template
        .replace("{tools}", &tool_block)
        .replace("{schema}", &action_request_schema_json())
}

/// 未注册工具的观察：列出全部可用工具（字典序，逗号分隔）
pub fn unavailable_tool_observation(tool: &str, available: &[String]) -> String {
    let list = if available.is_empty() {
        "(none)".to_string()
    } else {
        available.join(", ")
    };
    format!(
        "Tool '{}' is not available. Available tools: {}. Choose a valid tool or answer directly with FINAL ANSWER.",
        tool, list
    )
}

fn malformed_observation(error: &str) -> String {
    format!(
        "An error occurred while handling a tool request: {}. If a tool is not required, answer directly with FINAL ANSWER. If a tool is required, issue a correct tool request.",
        error
    )
}

/// 单步执行器：持有 Executor LLM、Critic、工具执行器与重试上限
pub struct StepExecutor {
    llm: Arc<dyn LlmClient>,
    prompt: String,
    critic: Critic,
    tools: Arc<ToolExecutor>,
    max_retries: usize,
}

impl StepExecutor {
    /// prompt 为模板，可含 `{tools}` 与 `{schema}` 占位符
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompt_template: &str,
        critic: Critic,
        tools: Arc<ToolExecutor>,
    ) -> Self {
        Self {
            prompt: render_executor_prompt(prompt_template, &tools),
            llm,
            critic,
            tools,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_default_prompt(
        llm: Arc<dyn LlmClient>,
        critic: Critic,
        tools: Arc<ToolExecutor>,
    ) -> Self {
        Self::new(llm, DEFAULT_EXECUTOR_PROMPT, critic, tools)
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn system_prompt(&self) -> &str {
        &self.prompt
    }

    /// 解决一个步骤；index 仅用于事件
    pub async fn execute(
        &self,
        index: usize,
        goal: &str,
        step: &str,
        events: Option<&UnboundedSender<RunEvent>>,
    ) -> StepOutcome {
        let mut state = AttemptState::new(goal, step);

        while state.attempts < self.max_retries {
            state.attempts += 1;
            send_event(
                events,
                RunEvent::Attempt {
                    index,
                    attempt: state.attempts,
                    max_attempts: self.max_retries,
                },
            );
            tracing::debug!(step = index, attempt = state.attempts, "executor attempt");

            let response = match self
                .llm
                .generate(&self.prompt, &state.to_executor_input())
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(step = index, "executor call failed: {}", e);
                    self.observe(
                        &mut state,
                        index,
                        events,
                        format!("Reasoning service error: {}. Retry.", e),
                    );
                    continue;
                }
            };
            send_event(
                events,
                RunEvent::ExecutorOutput {
                    index,
                    text: response.clone(),
                },
            );

            match parse_agent_output(&response) {
                AgentAction::FinalAnswer(answer) => {
                    match self.critic.critique(goal, step, &answer).await {
                        Ok(CriticResult::Pass) => {
                            send_event(
                                events,
                                RunEvent::Critique {
                                    index,
                                    passed: true,
                                    text: "PASS".to_string(),
                                },
                            );
                            tracing::info!(step = index, attempts = state.attempts, "step passed critique");
                            return StepOutcome::Answered {
                                answer,
                                attempts: state.attempts,
                            };
                        }
                        Ok(CriticResult::Critique(issues)) => {
                            send_event(
                                events,
                                RunEvent::Critique {
                                    index,
                                    passed: false,
                                    text: issues.clone(),
                                },
                            );
                            tracing::info!(step = index, attempt = state.attempts, "critique: {}", issues);
                            self.observe(&mut state, index, events, issues);
                        }
                        Err(e) => {
                            tracing::warn!(step = index, "critic call failed: {}", e);
                            self.observe(
                                &mut state,
                                index,
                                events,
                                format!("Critic unavailable ({}). Answer was not accepted.", e),
                            );
                        }
                    }
                }
                AgentAction::ToolRequest { name, input } => {
                    send_event(
                        events,
                        RunEvent::ToolCall {
                            index,
                            tool: name.clone(),
                            input: input.clone(),
                        },
                    );
                    let observation = if !self.tools.has_tool(&name) {
                        tracing::warn!(step = index, tool = %name, "tool not available");
                        unavailable_tool_observation(&name, &self.tools.tool_names())
                    } else {
                        match self.tools.execute(&name, &input).await {
                            Ok(result) => format!("Tool result: {}", result),
                            Err(e) => format!("Tool error: {}: {}", name, e),
                        }
                    };
                    self.observe(&mut state, index, events, observation);
                }
                AgentAction::Malformed { error, .. } => {
                    tracing::debug!(step = index, "malformed action: {}", error);
                    self.observe(&mut state, index, events, malformed_observation(&error));
                }
                AgentAction::Unparsable(_) => {
                    self.observe(&mut state, index, events, RETRY_WITH_CLARITY.to_string());
                }
            }
        }

        tracing::warn!(step = index, attempts = state.attempts, "step exhausted retries");
        StepOutcome::Failed {
            attempts: state.attempts,
            observations: state.observations,
        }
    }

    fn observe(
        &self,
        state: &mut AttemptState,
        index: usize,
        events: Option<&UnboundedSender<RunEvent>>,
        text: String,
    ) {
        send_event(
            events,
            RunEvent::Observation {
                index,
                text: text.clone(),
            },
        );
        state.observe(text);
    }
}
