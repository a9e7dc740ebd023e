//! Sequential workflow execution with per-action failure isolation.
//!
//! The executor runs one workflow's actions in order.  Continue-on-error
//! is the fixed policy: a failed action is recorded and the remaining
//! actions still run, so a run's success rate can be partial.  One run
//! record per action is appended to the store log as it completes.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use autopilot_core::{ActionKind, RunRecord, Workflow};
use autopilot_store::WorkflowStore;

use crate::registry::ActionRegistry;

/// Result of one action within a run.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub action_id: Uuid,
    pub action_type: ActionKind,
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
}

/// Aggregate result of one workflow run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub workflow_id: Uuid,
    pub success_count: usize,
    pub total_actions: usize,
    pub results: Vec<ActionResult>,
}

impl RunOutcome {
    /// Fraction of actions that succeeded (0 for an empty run).
    pub fn success_rate(&self) -> f64 {
        if self.total_actions == 0 {
            0.0
        } else {
            self.success_count as f64 / self.total_actions as f64
        }
    }
}

/// Runs one workflow's action list against the handler registry.
#[derive(Clone)]
pub struct Executor {
    registry: ActionRegistry,
    store: WorkflowStore,
}

impl Executor {
    pub fn new(registry: ActionRegistry, store: WorkflowStore) -> Self {
        Self { registry, store }
    }

    /// Execute every action of `workflow` in order.
    ///
    /// Updates `run_count`, `last_run`, and `success_rate` in place.  Each
    /// action's pre-delay is honored before it is dispatched; delays are
    /// cumulative across the sequence.
    pub async fn execute(&self, workflow: &mut Workflow) -> RunOutcome {
        info!(
            workflow_id = %workflow.id,
            name = %workflow.name,
            actions = workflow.actions.len(),
            "executing workflow"
        );

        workflow.run_count += 1;
        workflow.last_run = Some(Utc::now());

        let mut results = Vec::with_capacity(workflow.actions.len());
        for action in &workflow.actions {
            if action.delay_seconds > 0 {
                debug!(
                    action_id = %action.id,
                    seconds = action.delay_seconds,
                    "pre-action delay"
                );
                tokio::time::sleep(Duration::from_secs(u64::from(action.delay_seconds))).await;
            }

            let result = self.dispatch(action).await;
            self.append_record(workflow, &result);
            results.push(result);
        }

        let success_count = results.iter().filter(|r| r.success).count();
        let outcome = RunOutcome {
            workflow_id: workflow.id,
            success_count,
            total_actions: results.len(),
            results,
        };
        workflow.success_rate = outcome.success_rate();

        info!(
            workflow_id = %workflow.id,
            succeeded = success_count,
            total = outcome.total_actions,
            "workflow run complete"
        );
        outcome
    }

    /// Dispatch one action through the registry, mapping both a missing
    /// handler and a handler error to a failed result.
    async fn dispatch(&self, action: &autopilot_core::Action) -> ActionResult {
        let Some(handler) = self.registry.get(action.action_type) else {
            return ActionResult {
                action_id: action.id,
                action_type: action.action_type,
                success: false,
                message: format!("Unknown action type: {}", action.action_type),
                error: None,
            };
        };

        match handler.execute(&action.parameters).await {
            Ok(outcome) => ActionResult {
                action_id: action.id,
                action_type: action.action_type,
                success: outcome.success,
                message: outcome.message,
                error: None,
            },
            Err(e) => {
                error!(action_id = %action.id, error = %e, "action handler failed");
                ActionResult {
                    action_id: action.id,
                    action_type: action.action_type,
                    success: false,
                    message: String::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Append the action's run record; persistence failures are logged and
    /// swallowed so the run keeps going.
    fn append_record(&self, workflow: &Workflow, result: &ActionResult) {
        let record = RunRecord {
            timestamp: Utc::now(),
            workflow_id: workflow.id,
            workflow_name: workflow.name.clone(),
            action_id: result.action_id,
            action_type: result.action_type,
            success: result.success,
            message: result.message.clone(),
            error: result.error.clone(),
        };
        if let Err(e) = self.store.append_record(record) {
            warn!(workflow_id = %workflow.id, error = %e, "failed to append run record");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
