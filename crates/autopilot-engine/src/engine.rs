//! Automation engine facade — the host-facing API.
//!
//! [`AutomationEngine`] wires the rule parser, the shared workflow
//! collection, the executor, and the background scheduler together.  All
//! interaction from the host (workflow creation, manual invocation, status
//! queries) goes through this type; the polling loop runs on its own tokio
//! task and shares state through [`Runner`].

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use autopilot_core::{Trigger, Workflow};
use autopilot_store::WorkflowStore;

use crate::error::{EngineError, Result};
use crate::executor::{Executor, RunOutcome};
use crate::parser::RuleParser;
use crate::registry::ActionRegistry;
use crate::scheduler::Scheduler;

/// The in-memory workflow collection, shared between the host-facing API
/// and the scheduler task.
pub(crate) type SharedWorkflows = Arc<RwLock<Vec<Workflow>>>;

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Shared execution path for scheduler-fired and host-invoked workflows.
///
/// Execution works on a copy of the workflow so creators and status queries
/// are not blocked while actions (and their delays) run; bookkeeping is
/// written back under the lock afterwards.  A dedicated mutex serializes
/// runs: workflows execute one at a time, never concurrently with each
/// other.
#[derive(Clone)]
pub(crate) struct Runner {
    pub(crate) workflows: SharedWorkflows,
    pub(crate) executor: Executor,
    pub(crate) store: WorkflowStore,
    exec_lock: Arc<Mutex<()>>,
}

impl Runner {
    pub(crate) fn new(workflows: SharedWorkflows, executor: Executor, store: WorkflowStore) -> Self {
        Self {
            workflows,
            executor,
            store,
            exec_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Run one workflow by id and persist the updated collection.
    pub(crate) async fn run(&self, id: Uuid) -> Result<RunOutcome> {
        let _serial = self.exec_lock.lock().await;

        // Mark the fire and take a working copy.
        let mut working = {
            let mut list = self.workflows.write().await;
            let workflow = list
                .iter_mut()
                .find(|w| w.id == id)
                .ok_or(EngineError::WorkflowNotFound { workflow_id: id })?;
            workflow.trigger.last_fired_at = Some(Utc::now());
            workflow.clone()
        };

        let outcome = self.executor.execute(&mut working).await;

        // Write bookkeeping back and persist the collection.
        let snapshot = {
            let mut list = self.workflows.write().await;
            if let Some(workflow) = list.iter_mut().find(|w| w.id == id) {
                workflow.run_count = working.run_count;
                workflow.last_run = working.last_run;
                workflow.success_rate = working.success_rate;
            }
            list.clone()
        };
        if let Err(e) = self.store.save(&snapshot) {
            warn!(workflow_id = %id, error = %e, "failed to persist workflows after run");
        }

        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Host-facing types
// ---------------------------------------------------------------------------

/// Outcome of a workflow-creation request.
///
/// Creation never errs: unparseable commands fall back to a manual
/// workflow, and persistence failures are logged without rolling back the
/// in-memory collection.
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub success: bool,
    pub message: String,
    pub workflow: Option<Workflow>,
}

/// Aggregate engine state for dashboards and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    pub total_workflows: usize,
    pub active_workflows: usize,
    pub total_runs: u64,
    pub average_success_rate: f64,
    /// Run records from the last seven days.
    pub recent_executions: usize,
}

// ---------------------------------------------------------------------------
// AutomationEngine
// ---------------------------------------------------------------------------

/// The automation engine.
pub struct AutomationEngine {
    runner: Runner,
    parser: RuleParser,
    scheduler: Scheduler,
}

impl AutomationEngine {
    /// Build an engine over `store`, loading any persisted workflows.
    pub fn new(store: WorkflowStore, registry: ActionRegistry) -> Result<Self> {
        let workflows: SharedWorkflows = Arc::new(RwLock::new(store.load()));
        let executor = Executor::new(registry, store.clone());
        let runner = Runner::new(workflows, executor, store);

        Ok(Self {
            parser: RuleParser::new()?,
            scheduler: Scheduler::new(runner.clone()),
            runner,
        })
    }

    /// Create a workflow from a natural-language command and persist it.
    pub async fn create_workflow_from_command(&self, command: &str) -> CreateOutcome {
        let Some(rule) = self.parser.parse(command) else {
            return CreateOutcome {
                success: false,
                message: "Could not understand the automation request.".to_string(),
                workflow: None,
            };
        };

        let trigger = Trigger::new(rule.trigger_name, rule.spec);
        let workflow = Workflow::new(rule.name, rule.description, trigger, rule.actions);

        let snapshot = {
            let mut list = self.runner.workflows.write().await;
            list.push(workflow.clone());
            list.clone()
        };
        if let Err(e) = self.runner.store.save(&snapshot) {
            warn!(workflow_id = %workflow.id, error = %e, "failed to persist new workflow");
        }

        info!(
            workflow_id = %workflow.id,
            name = %workflow.name,
            trigger_type = workflow.trigger.spec.type_name(),
            "workflow created"
        );

        CreateOutcome {
            success: true,
            message: format!("Workflow '{}' created", workflow.name),
            workflow: Some(workflow),
        }
    }

    /// Start the background scheduler (no-op when already running).
    pub async fn start(&self) {
        self.scheduler.start().await;
    }

    /// Stop the scheduler, waiting briefly for the loop to exit.
    pub async fn stop(&self) {
        self.scheduler.stop().await;
    }

    /// Whether the scheduler loop is currently running.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Snapshot of all workflows.
    pub async fn workflows(&self) -> Vec<Workflow> {
        self.runner.workflows.read().await.clone()
    }

    /// Directly run one workflow — the invocation path the external command
    /// router uses for `voice` and `manual` workflows.
    pub async fn run_workflow(&self, id: Uuid) -> Result<RunOutcome> {
        self.runner.run(id).await
    }

    /// Find the first enabled voice workflow whose phrase matches the
    /// utterance.
    pub async fn find_workflow_by_phrase(&self, utterance: &str) -> Option<Workflow> {
        let list = self.runner.workflows.read().await;
        list.iter()
            .find(|w| w.enabled && w.trigger.spec.matches_phrase(utterance))
            .cloned()
    }

    /// Enable or disable a workflow (and its trigger) by id.
    pub async fn set_enabled(&self, id: Uuid, enabled: bool) -> Result<()> {
        let snapshot = {
            let mut list = self.runner.workflows.write().await;
            let workflow = list
                .iter_mut()
                .find(|w| w.id == id)
                .ok_or(EngineError::WorkflowNotFound { workflow_id: id })?;
            workflow.enabled = enabled;
            workflow.trigger.enabled = enabled;
            list.clone()
        };
        self.runner.store.save(&snapshot)?;
        info!(workflow_id = %id, enabled, "workflow toggled");
        Ok(())
    }

    /// Remove a workflow by id.  Workflows are never removed automatically;
    /// this is the explicit host-initiated path.
    pub async fn remove_workflow(&self, id: Uuid) -> Result<()> {
        let snapshot = {
            let mut list = self.runner.workflows.write().await;
            let before = list.len();
            list.retain(|w| w.id != id);
            if list.len() == before {
                return Err(EngineError::WorkflowNotFound { workflow_id: id });
            }
            list.clone()
        };
        self.runner.store.save(&snapshot)?;
        info!(workflow_id = %id, "workflow removed");
        Ok(())
    }

    /// Aggregate status for dashboards and the CLI.
    pub async fn status(&self) -> EngineStatus {
        let (total, active, total_runs, average_success_rate) = {
            let list = self.runner.workflows.read().await;
            let total = list.len();
            let active = list.iter().filter(|w| w.enabled).count();
            let total_runs = list.iter().map(|w| w.run_count).sum();
            let average_success_rate = if total == 0 {
                0.0
            } else {
                list.iter().map(|w| w.success_rate).sum::<f64>() / total as f64
            };
            (total, active, total_runs, average_success_rate)
        };

        let week_ago = Utc::now() - chrono::Duration::days(7);
        let recent_executions = self.runner.store.recent_records(week_ago).len();

        EngineStatus {
            running: self.is_running(),
            total_workflows: total,
            active_workflows: active,
            total_runs,
            average_success_rate,
            recent_executions,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
