//! 编排器端到端场景：Mock 推理服务 + 本地嵌入

use std::sync::Arc;

use hive::config::OrchestratorSection;
use hive::core::{Orchestrator, StepOutcome};
use hive::llm::{EmbeddingProvider, LlmClient, MockLlmClient};
use hive::memory::MemoryStore;
use hive::react::{Critic, Planner, RunEvent, StepExecutor};
use hive::tools::{builtin_registry, ToolExecutor};

const SENTINEL: &str = "❌ Step failed after retries.";

/// 所有文本映射到同一方向，检索分数恒为 1.0
struct ConstEmbedder;

impl EmbeddingProvider for ConstEmbedder {
    fn embed_sync(&self, _text: &str) -> Result<Vec<f32>, String> {
        Ok(vec![1.0, 0.0])
    }
}

fn tools(names: &[&str]) -> Arc<ToolExecutor> {
    let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    Arc::new(ToolExecutor::new(builtin_registry(&names), 5))
}

fn build(
    planner: Arc<dyn LlmClient>,
    executor: Arc<dyn LlmClient>,
    critic: Arc<dyn LlmClient>,
    tools: Arc<ToolExecutor>,
) -> Orchestrator {
    let executor =
        StepExecutor::with_default_prompt(executor, Critic::with_default_prompt(critic), tools);
    Orchestrator::new(
        Planner::with_default_prompt(planner),
        executor,
        OrchestratorSection::default(),
    )
}

fn memory_with(seed: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new(Arc::new(ConstEmbedder), 2));
    store.insert(seed, "general").unwrap();
    store
}

#[tokio::test]
async fn scenario_a_three_steps_answered_and_remembered() {
    let memory = memory_with("Vector databases enable similarity search.");
    let orch = build(
        Arc::new(MockLlmClient::always(
            "Here is the plan:\n1. First benefit\n2. Second benefit\n3. Third benefit",
        )),
        Arc::new(MockLlmClient::scripted([
            "FINAL ANSWER: Fast similarity search",
            "FINAL ANSWER: Scales to large corpora",
            "FINAL ANSWER: Grounds answers in retrieved context",
        ])),
        Arc::new(MockLlmClient::always("PASS")),
        tools(&[]),
    )
    .with_memory(memory.clone());

    let report = orch
        .run_detailed("List the top 3 benefits of X")
        .await
        .unwrap();
    assert_eq!(report.plan.len(), 3);
    assert!(report.steps.iter().all(|s| s.outcome.attempts() == 1));
    assert_eq!(
        report.output(),
        "Fast similarity search\n\nScales to large corpora\n\nGrounds answers in retrieved context"
    );

    let learned: Vec<String> = memory
        .records_by_topic("learned_answer")
        .into_iter()
        .map(|r| r.content)
        .collect();
    assert_eq!(
        learned,
        vec![
            "Fast similarity search",
            "Scales to large corpora",
            "Grounds answers in retrieved context",
        ]
    );
}

#[tokio::test]
async fn scenario_b_always_critiqued_step_fails_without_insert() {
    let memory = memory_with("seed");
    let executor = Arc::new(MockLlmClient::always("FINAL ANSWER: weak answer"));
    let orch = build(
        Arc::new(MockLlmClient::always("1. Only step")),
        executor.clone(),
        Arc::new(MockLlmClient::always("CRITIQUE: issue")),
        tools(&[]),
    )
    .with_memory(memory.clone());

    let report = orch.run_detailed("goal").await.unwrap();
    assert_eq!(report.output(), SENTINEL);
    match &report.steps[0].outcome {
        StepOutcome::Failed {
            attempts,
            observations,
        } => {
            assert_eq!(*attempts, 3);
            assert_eq!(observations.len(), 3);
            assert!(observations.iter().all(|o| o == "CRITIQUE: issue"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(executor.call_count(), 3);
    assert_eq!(memory.len(), 1);
}

#[tokio::test]
async fn scenario_c_tool_result_feeds_next_attempt() {
    let executor = Arc::new(MockLlmClient::scripted([
        r#"{"action": "calculator", "input": "2+2"}"#,
        "FINAL ANSWER: 4",
    ]));
    let orch = build(
        Arc::new(MockLlmClient::always("1. Add two and two")),
        executor.clone(),
        Arc::new(MockLlmClient::always("PASS")),
        tools(&["calculator"]),
    );

    let report = orch.run_detailed("What is 2+2?").await.unwrap();
    assert_eq!(report.output(), "4");
    assert_eq!(report.steps[0].outcome.attempts(), 2);

    let calls = executor.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[0].input.contains("Tool result"));
    assert!(calls[1].input.contains("Tool result: 4"));
}

#[tokio::test]
async fn scenario_d_unknown_tool_lists_capabilities_and_counts_attempt() {
    let executor = Arc::new(MockLlmClient::always(
        r#"{"action": "translator", "input": "bonjour"}"#,
    ));
    let orch = build(
        Arc::new(MockLlmClient::always("1. Translate")),
        executor.clone(),
        Arc::new(MockLlmClient::always("PASS")),
        tools(&["word_count", "calculator"]),
    );

    let report = orch.run_detailed("goal").await.unwrap();
    match &report.steps[0].outcome {
        StepOutcome::Failed {
            attempts,
            observations,
        } => {
            assert_eq!(*attempts, 3);
            for o in observations {
                assert!(o.contains("'translator'"));
                assert!(o.contains("Available tools: calculator, word_count."));
            }
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(executor.call_count(), 3);
}

#[tokio::test]
async fn recalled_memory_reaches_planner() {
    let memory = memory_with("Critic agents should not rewrite answers.");
    let planner = Arc::new(MockLlmClient::always("1. Step"));
    let orch = build(
        planner.clone(),
        Arc::new(MockLlmClient::always("FINAL ANSWER: ok")),
        Arc::new(MockLlmClient::always("PASS")),
        tools(&[]),
    )
    .with_memory(memory);

    let report = orch.run_detailed("Design a critic").await.unwrap();
    assert_eq!(report.memories, vec!["Critic agents should not rewrite answers."]);
    let input = &planner.calls()[0].input;
    assert!(input.starts_with("GOAL:\nDesign a critic"));
    assert!(input.contains("MEMORY:\nCritic agents should not rewrite answers."));
}

#[tokio::test]
async fn events_follow_run_order() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let orch = build(
        Arc::new(MockLlmClient::always("1. Step")),
        Arc::new(MockLlmClient::always("FINAL ANSWER: ok")),
        Arc::new(MockLlmClient::always("PASS")),
        tools(&[]),
    )
    .with_events(tx);

    orch.run("goal").await.unwrap();
    drop(orch);

    let mut kinds = Vec::new();
    while let Some(ev) = rx.recv().await {
        kinds.push(match ev {
            RunEvent::MemoryRecall { .. } => "recall",
            RunEvent::Planned { .. } => "planned",
            RunEvent::StepStarted { .. } => "started",
            RunEvent::Attempt { .. } => "attempt",
            RunEvent::ExecutorOutput { .. } => "output",
            RunEvent::Critique { .. } => "critique",
            RunEvent::StepResolved { .. } => "resolved",
            _ => "other",
        });
    }
    assert_eq!(
        kinds,
        vec!["recall", "planned", "started", "attempt", "output", "critique", "resolved"]
    );
}
