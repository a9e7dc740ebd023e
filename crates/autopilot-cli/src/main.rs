//! CLI entry point for Autopilot.
//!
//! This binary provides the `autopilot` command with subcommands for
//! running the scheduler, adding rules, and inspecting state.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use autopilot_core::Workflow;
use autopilot_engine::{ActionRegistry, AutomationEngine};
use autopilot_store::WorkflowStore;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Autopilot — natural-language automation workflows.
#[derive(Parser)]
#[command(
    name = "autopilot",
    version,
    about = "Autopilot — natural-language automation workflows",
    long_about = "Describe automation rules in plain language (\"every morning at 8am, \
                  remind me to take vitamins\") and run them continuously in the \
                  background."
)]
struct Cli {
    /// Directory holding workflows.json and automation_log.json.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the scheduler and enter the interactive prompt.
    Run,

    /// Create a workflow from a natural-language rule.
    Add {
        /// The rule text, e.g. "every weekday at 9am, stand up and stretch".
        rule: String,
    },

    /// List stored workflows.
    List,

    /// Show engine status.
    Status,

    /// Show recent run records.
    Log {
        /// Number of records to show.
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },

    /// Run one workflow immediately by id.
    Trigger { workflow_id: Uuid },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => cmd_run(&cli.data_dir).await,
        Commands::Add { rule } => cmd_add(&cli.data_dir, &rule).await,
        Commands::List => cmd_list(&cli.data_dir).await,
        Commands::Status => cmd_status(&cli.data_dir).await,
        Commands::Log { count } => cmd_log(&cli.data_dir, count),
        Commands::Trigger { workflow_id } => cmd_trigger(&cli.data_dir, workflow_id).await,
    }
}

fn open_engine(data_dir: &Path) -> Result<AutomationEngine> {
    let store = WorkflowStore::open(data_dir).context("failed to open data directory")?;
    AutomationEngine::new(store, ActionRegistry::with_builtins())
        .context("failed to build automation engine")
}

// ---------------------------------------------------------------------------
// Subcommand: run
// ---------------------------------------------------------------------------

async fn cmd_run(data_dir: &Path) -> Result<()> {
    init_tracing("info");

    let engine = open_engine(data_dir)?;
    engine.start().await;
    info!("scheduler running");

    println!();
    println!("  Autopilot v{}", env!("CARGO_PKG_VERSION"));
    println!("  Type an automation rule, or 'list', 'status', 'quit'.");
    println!();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read input")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed {
            "quit" | "exit" => break,
            "list" => print_workflows(&engine.workflows().await),
            "status" => print_status(&engine).await,
            rule => {
                let outcome = engine.create_workflow_from_command(rule).await;
                println!("  {}", outcome.message);
                if let Some(workflow) = outcome.workflow {
                    println!(
                        "    trigger: {} ({}) | actions: {}",
                        workflow.trigger.name,
                        workflow.trigger.spec.type_name(),
                        workflow.actions.len()
                    );
                }
            }
        }
    }

    engine.stop().await;
    info!("shut down");
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: add
// ---------------------------------------------------------------------------

async fn cmd_add(data_dir: &Path, rule: &str) -> Result<()> {
    init_tracing("warn");

    let engine = open_engine(data_dir)?;
    let outcome = engine.create_workflow_from_command(rule).await;

    println!("  {}", outcome.message);
    if let Some(workflow) = outcome.workflow {
        println!("    id:      {}", workflow.id);
        println!(
            "    trigger: {} ({})",
            workflow.trigger.name,
            workflow.trigger.spec.type_name()
        );
        println!("    actions: {}", workflow.actions.len());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: list
// ---------------------------------------------------------------------------

async fn cmd_list(data_dir: &Path) -> Result<()> {
    init_tracing("warn");

    let engine = open_engine(data_dir)?;
    let workflows = engine.workflows().await;

    if workflows.is_empty() {
        println!("  No workflows. Add one with `autopilot add \"<rule>\"`.");
        return Ok(());
    }

    print_workflows(&workflows);
    Ok(())
}

fn print_workflows(workflows: &[Workflow]) {
    println!();
    for workflow in workflows {
        let state = if workflow.enabled { "on " } else { "off" };
        println!(
            "  [{state}] {}  {}  trigger={}  runs={}  success={:.0}%",
            workflow.id,
            workflow.name,
            workflow.trigger.spec.type_name(),
            workflow.run_count,
            workflow.success_rate * 100.0,
        );
    }
    println!();
}

// ---------------------------------------------------------------------------
// Subcommand: status
// ---------------------------------------------------------------------------

async fn cmd_status(data_dir: &Path) -> Result<()> {
    init_tracing("warn");

    let engine = open_engine(data_dir)?;
    print_status(&engine).await;
    Ok(())
}

async fn print_status(engine: &AutomationEngine) {
    let status = engine.status().await;
    println!();
    println!("  Autopilot Status");
    println!("  ----------------");
    println!("  Scheduler:        {}", on_off(status.running));
    println!("  Workflows:        {}", status.total_workflows);
    println!("  Active:           {}", status.active_workflows);
    println!("  Total runs:       {}", status.total_runs);
    println!(
        "  Success rate:     {:.0}%",
        status.average_success_rate * 100.0
    );
    println!("  Runs (last 7d):   {}", status.recent_executions);
    println!();
}

fn on_off(running: bool) -> &'static str {
    if running { "running" } else { "stopped" }
}

// ---------------------------------------------------------------------------
// Subcommand: log
// ---------------------------------------------------------------------------

fn cmd_log(data_dir: &Path, count: usize) -> Result<()> {
    init_tracing("warn");

    let store = WorkflowStore::open(data_dir).context("failed to open data directory")?;
    let log = store.load_log();

    if log.is_empty() {
        println!("  The run log is empty.");
        return Ok(());
    }

    println!();
    for record in log.iter().rev().take(count).rev() {
        let status = if record.success { "ok  " } else { "FAIL" };
        let detail = record
            .error
            .as_deref()
            .unwrap_or(record.message.as_str());
        println!(
            "  {} {status} {}/{}  {detail}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.workflow_name,
            record.action_type,
        );
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: trigger
// ---------------------------------------------------------------------------

async fn cmd_trigger(data_dir: &Path, workflow_id: Uuid) -> Result<()> {
    init_tracing("info");

    let engine = open_engine(data_dir)?;
    let outcome = engine
        .run_workflow(workflow_id)
        .await
        .context("failed to run workflow")?;

    println!(
        "  {}/{} actions succeeded",
        outcome.success_count, outcome.total_actions
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
