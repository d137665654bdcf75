//! Planner：把目标（可附带长期记忆上下文）拆成有序步骤
//!
//! 只调用一次 LLM；逐行扫描回复，保留首个非空白字符为 1-9 的行，其余（标题、空行、说明）丢弃。
//! 保留的行原样返回，不重新编号、不修剪。没有任何编号行时返回空计划，由编排器产出空结果。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::LlmClient;

pub const DEFAULT_PLANNER_PROMPT: &str = "You are a planning agent.

Use any provided MEMORY if relevant.

Your job:
- Understand the goal thoroughly
- Break it into small, achievable steps
- Do NOT execute any step

Output format:
1. Step one
2. Step two
...";

/// 一行是否为步骤：首个非空白字符是 1-9
pub fn is_step_line(line: &str) -> bool {
    matches!(line.trim_start().chars().next(), Some('1'..='9'))
}

/// 从计划文本中提取步骤行，保持原顺序与原文
pub fn parse_steps(plan: &str) -> Vec<String> {
    plan.lines()
        .filter(|line| is_step_line(line))
        .map(String::from)
        .collect()
}

/// 拼 Planner 输入：GOAL，记忆上下文非空时追加 MEMORY
pub fn planner_input(goal: &str, memory_context: &str) -> String {
    if memory_context.trim().is_empty() {
        format!("GOAL:\n{}", goal)
    } else {
        format!("GOAL:\n{}\n\nMEMORY:\n{}", goal, memory_context)
    }
}

/// Planner：持有 LLM 与角色指令
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn with_default_prompt(llm: Arc<dyn LlmClient>) -> Self {
        Self::new(llm, DEFAULT_PLANNER_PROMPT)
    }

    /// 生成计划原文
    pub async fn plan_text(&self, goal: &str, memory_context: &str) -> Result<String, AgentError> {
        self.llm
            .generate(&self.system_prompt, &planner_input(goal, memory_context))
            .await
            .map_err(AgentError::LlmError)
    }

    /// 生成并解析计划
    pub async fn plan(&self, goal: &str, memory_context: &str) -> Result<Vec<String>, AgentError> {
        let text = self.plan_text(goal, memory_context).await?;
        let steps = parse_steps(&text);
        if steps.is_empty() {
            tracing::warn!("planner returned no numbered steps");
        }
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[test]
    fn test_parse_keeps_only_numbered_lines_verbatim() {
        let plan = "Here is the plan:\n\n1. Define X\n   2) Explain Y  \n- bullet\n0. zero\n3. Summarize\n";
        assert_eq!(
            parse_steps(plan),
            vec!["1. Define X", "   2) Explain Y  ", "3. Summarize"]
        );
    }

    #[test]
    fn test_multi_digit_enumerators_keep_leading_digit_rule() {
        // 10 以后的行首字符仍是 1-9，会被保留
        let plan = "9. nine\n10. ten\n0) nothing";
        assert_eq!(parse_steps(plan), vec!["9. nine", "10. ten"]);
    }

    #[test]
    fn test_no_numbered_lines_gives_empty_plan() {
        assert!(parse_steps("Sure! I can help with that.").is_empty());
        assert!(parse_steps("").is_empty());
    }

    #[test]
    fn test_planner_input_memory_block() {
        assert_eq!(planner_input("g", ""), "GOAL:\ng");
        assert_eq!(planner_input("g", "fact"), "GOAL:\ng\n\nMEMORY:\nfact");
    }

    #[tokio::test]
    async fn test_plan_calls_llm_once() {
        let llm = Arc::new(MockLlmClient::always("1. a\n2. b"));
        let planner = Planner::with_default_prompt(llm.clone());
        let steps = planner.plan("goal", "memo").await.unwrap();
        assert_eq!(steps, vec!["1. a", "2. b"]);
        assert_eq!(llm.call_count(), 1);
        let call = &llm.calls()[0];
        assert!(call.system.contains("Do NOT execute"));
        assert!(call.input.contains("MEMORY:\nmemo"));
    }
}
