//! 单步尝试状态与结果
//!
//! AttemptState 只在一个 Step 的 Executor Loop 内存活：每个 Step 新建，尝试间原地修改，Step 结束即丢弃。

use serde::Serialize;

/// 单个 Step 的可变尝试记录：goal、step、观察列表、已用尝试次数
#[derive(Debug, Clone)]
pub struct AttemptState {
    pub goal: String,
    pub step: String,
    /// 按追加顺序保存，不去重、不截断
    pub observations: Vec<String>,
    pub attempts: usize,
}

impl AttemptState {
    pub fn new(goal: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            step: step.into(),
            observations: Vec::new(),
            attempts: 0,
        }
    }

    pub fn observe(&mut self, observation: impl Into<String>) {
        self.observations.push(observation.into());
    }

    /// 拼成 Executor 的输入：GOAL / STEP / OBSERVATIONS，观察逐条原样列出
    pub fn to_executor_input(&self) -> String {
        let observations = if self.observations.is_empty() {
            "(none)".to_string()
        } else {
            self.observations
                .iter()
                .map(|o| format!("- {}", o))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            "GOAL:\n{}\n\nSTEP:\n{}\n\nOBSERVATIONS:\n{}",
            self.goal, self.step, observations
        )
    }
}

/// Step 的最终结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Critic 给出 PASS 的答案
    Answered { answer: String, attempts: usize },
    /// 用尽 max_retries 仍未通过
    Failed {
        attempts: usize,
        observations: Vec<String>,
    },
}

impl StepOutcome {
    pub fn attempts(&self) -> usize {
        match self {
            StepOutcome::Answered { attempts, .. } | StepOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            StepOutcome::Answered { answer, .. } => Some(answer),
            StepOutcome::Failed { .. } => None,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, StepOutcome::Answered { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_input_without_observations() {
        let state = AttemptState::new("goal text", "1. first step");
        let input = state.to_executor_input();
        assert!(input.contains("GOAL:\ngoal text"));
        assert!(input.contains("STEP:\n1. first step"));
        assert!(input.ends_with("OBSERVATIONS:\n(none)"));
    }

    #[test]
    fn test_observations_kept_verbatim_and_duplicated() {
        let mut state = AttemptState::new("g", "s");
        state.observe("CRITIQUE:\n- too vague");
        state.observe("CRITIQUE:\n- too vague");
        let input = state.to_executor_input();
        assert_eq!(input.matches("CRITIQUE:\n- too vague").count(), 2);
        assert_eq!(state.observations.len(), 2);
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = StepOutcome::Answered {
            answer: "done".into(),
            attempts: 2,
        };
        assert!(ok.is_answered());
        assert_eq!(ok.answer(), Some("done"));
        assert_eq!(ok.attempts(), 2);

        let failed = StepOutcome::Failed {
            attempts: 3,
            observations: vec![],
        };
        assert!(!failed.is_answered());
        assert_eq!(failed.answer(), None);
    }
}
