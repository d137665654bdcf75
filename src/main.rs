//! Hive - 多角色智能体编排
//!
//! 入口：初始化日志、加载配置、组装编排器（或单智能体），运行目标并打印结果与已学习的记忆。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hive::config::load_config;
use hive::core::OrchestratorBuilder;
use hive::llm::create_role_clients;
use hive::react::{RunEvent, SoloAgent};

const DEFAULT_GOAL: &str = "List the top 3 benefits of using vector databases in AI systems";

#[derive(Debug, Parser)]
#[command(name = "hive", about = "Planner / Executor / Critic orchestration with long-term memory")]
struct Cli {
    /// 单智能体工具循环（无 Planner / Critic）
    #[arg(long)]
    solo: bool,

    /// 额外的配置文件（覆盖 config/default.toml）
    #[arg(long, env = "HIVE_CONFIG")]
    config: Option<PathBuf>,

    /// 目标；省略时运行内置示例目标
    goal: Vec<String>,
}

fn print_event(ev: &RunEvent) {
    match ev {
        RunEvent::MemoryRecall { memories } => {
            println!("🧠 Recalled {} memories", memories.len());
            for m in memories {
                println!("   - {}", m);
            }
        }
        RunEvent::Planned { steps } => {
            println!("📋 Plan:");
            for (i, s) in steps.iter().enumerate() {
                println!("   {}. {}", i + 1, s);
            }
        }
        RunEvent::StepStarted { index, step } => println!("\n▶️  Step {}: {}", index + 1, step),
        RunEvent::Attempt {
            attempt,
            max_attempts,
            ..
        } => println!("   🔁 Attempt {}/{}", attempt, max_attempts),
        RunEvent::ExecutorOutput { .. } => {}
        RunEvent::ToolCall { tool, input, .. } => println!("   🔧 {}({})", tool, input),
        RunEvent::Observation { text, .. } => println!("   👀 {}", text),
        RunEvent::Critique { passed, text, .. } => {
            if *passed {
                println!("   ✅ Critic: PASS");
            } else {
                println!("   📝 Critic: {}", text);
            }
        }
        RunEvent::StepResolved { .. } => println!("   ✔️  Step accepted"),
        RunEvent::StepFailed { attempts, .. } => {
            println!("   ❌ Step failed after {} attempts", attempts)
        }
        RunEvent::MemoryStored { topic, .. } => println!("   💾 Stored answer under '{}'", topic),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hive::observability::init();

    let cli = Cli::parse();
    let goal = if cli.goal.is_empty() {
        DEFAULT_GOAL.to_string()
    } else {
        cli.goal.join(" ")
    };

    let cfg = load_config(cli.config).context("Failed to load config")?;
    let clients = create_role_clients(&cfg);

    if cli.solo {
        let tools = OrchestratorBuilder::new(cfg).build_tools();
        let agent = SoloAgent::new(clients.executor, tools);
        println!("🚀 Task: {}\n", goal);
        println!("{}", agent.run(&goal).await);
        return Ok(());
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            print_event(&ev);
        }
    });

    let learned_topic = cfg.orchestrator.learned_topic.clone();
    let orchestrator = OrchestratorBuilder::new(cfg)
        .with_clients(clients.clone())
        .with_events(tx)
        .build()
        .context("Failed to build orchestrator")?;
    let memory = orchestrator.memory().map(Arc::clone);

    println!("🚀 Goal: {}\n", goal);
    let output = orchestrator.run(&goal).await.context("Run failed")?;

    // 关闭事件通道，等待打印任务排空
    drop(orchestrator);
    let _ = printer.await;

    println!("\n===== FINAL OUTPUT =====\n{}", output);

    if let Some(memory) = memory {
        let learned = memory.records_by_topic(&learned_topic);
        println!("\n===== LEARNED MEMORIES ({}) =====", learned.len());
        for r in learned {
            println!("[{}] {}", r.timestamp.format("%Y-%m-%d %H:%M:%S"), r.content);
        }
    }

    for (role, client) in [
        ("planner", &clients.planner),
        ("executor", &clients.executor),
        ("critic", &clients.critic),
    ] {
        let (prompt, completion, total) = client.token_usage();
        tracing::info!(role, prompt, completion, total, "token usage");
    }

    Ok(())
}
