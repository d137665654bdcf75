//! 单智能体工具循环（无 Planner / Critic）
//!
//! 每一步的输入只是上一步的结果：工具结果、工具不可用提示或初始任务。
//! 遇到 FINAL ANSWER 返回完整回复；回复既不是 FINAL ANSWER 也不是合法动作时立即放弃。

use std::sync::Arc;

use crate::llm::LlmClient;
use crate::react::action::{parse_agent_output, AgentAction};
use crate::react::loop_::render_executor_prompt;
use crate::tools::ToolExecutor;

pub const DEFAULT_SOLO_MAX_STEPS: usize = 5;
pub const INVALID_FORMAT: &str = "❌ Invalid agent response format";
pub const DID_NOT_FINISH: &str = "❌ Agent did not finish.";

pub const DEFAULT_SOLO_PROMPT: &str = "You are an autonomous agent.

You have access to the following tools:
{tools}

When you need a tool, respond EXACTLY in JSON matching this schema:
{schema}
Example: {\"action\": \"tool_name\", \"input\": \"tool input\"}

If no tool is needed, respond with:
FINAL ANSWER: <your answer>";

pub struct SoloAgent {
    llm: Arc<dyn LlmClient>,
    prompt: String,
    tools: Arc<ToolExecutor>,
    max_steps: usize,
}

impl SoloAgent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolExecutor>) -> Self {
        Self {
            prompt: render_executor_prompt(DEFAULT_SOLO_PROMPT, &tools),
            llm,
            tools,
            max_steps: DEFAULT_SOLO_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub async fn run(&self, task: &str) -> String {
        let mut context = task.to_string();

        for step in 1..=self.max_steps {
            let response = match self.llm.generate(&self.prompt, &context).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(step, "solo agent call failed: {}", e);
                    context = format!("Error:\nThe previous request failed: {}\nPlease try again.", e);
                    continue;
                }
            };
            tracing::debug!(step, "solo agent output: {}", response);

            match parse_agent_output(&response) {
                AgentAction::FinalAnswer(_) => return response.trim().to_string(),
                AgentAction::ToolRequest { name, input } => {
                    if !self.tools.has_tool(&name) {
                        context = format!(
                            "Error:\nThe tool '{}' is not available.\nAvailable tools are: {}\nPlease choose a valid tool or finish without using a tool.",
                            name,
                            self.tools.tool_names().join(", ")
                        );
                        continue;
                    }
                    let observation = match self.tools.execute(&name, &input).await {
                        Ok(r) => r,
                        Err(e) => format!("Error: {}", e),
                    };
                    tracing::info!(step, tool = %name, "observation: {}", observation);
                    context = format!("Tool result:\n{}\n\nContinue reasoning.", observation);
                }
                AgentAction::Malformed { .. } | AgentAction::Unparsable(_) => {
                    return INVALID_FORMAT.to_string();
                }
            }
        }

        DID_NOT_FINISH.to_string()
    }
}
