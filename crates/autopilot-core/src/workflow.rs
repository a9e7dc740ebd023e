//! Workflow aggregate: one trigger plus an ordered list of actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trigger::Trigger;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The kind of side effect an action performs.
///
/// Closed set: the host extends behavior by registering handlers for these
/// kinds, not by inventing new tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Command,
    Notification,
    Email,
    ApiCall,
    FileOperation,
    Reminder,
    Delay,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Command => "command",
            Self::Notification => "notification",
            Self::Email => "email",
            Self::ApiCall => "api_call",
            Self::FileOperation => "file_operation",
            Self::Reminder => "reminder",
            Self::Delay => "delay",
        };
        f.write_str(name)
    }
}

/// One unit of side-effecting work within a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier (UUID v7).
    pub id: Uuid,
    pub action_type: ActionKind,
    /// Handler-owned parameter bag; its shape depends on `action_type`.
    pub parameters: serde_json::Value,
    /// Seconds to wait before this action runs.  Delays accumulate across
    /// the sequence.
    #[serde(default)]
    pub delay_seconds: u32,
    /// Reserved for handler-level retries.
    #[serde(default)]
    pub retry_count: u32,
}

impl Action {
    /// Create an action with a fresh id and no delay.
    pub fn new(action_type: ActionKind, parameters: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            action_type,
            parameters,
            delay_seconds: 0,
            retry_count: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A named automation: one trigger and the ordered actions it runs.
///
/// The workflow exclusively owns its trigger and actions.  The executor
/// mutates `run_count`, `last_run`, and `success_rate` in place after each
/// run; workflows are never removed automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique identifier (UUID v7).
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub trigger: Trigger,
    pub actions: Vec<Action>,
    pub enabled: bool,
    #[serde(default)]
    pub run_count: u64,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    /// Fraction of actions that succeeded on the most recent run.
    #[serde(default)]
    pub success_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl Workflow {
    /// Create an enabled workflow with a fresh id and zeroed run statistics.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        trigger: Trigger,
        actions: Vec<Action>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            description: description.into(),
            trigger,
            actions,
            enabled: true,
            run_count: 0,
            last_run: None,
            success_rate: 0.0,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Run log
// ---------------------------------------------------------------------------

/// One log entry for one executed action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: DateTime<Utc>,
    pub workflow_id: Uuid,
    pub workflow_name: String,
    pub action_id: Uuid,
    pub action_type: ActionKind,
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::{DayOfWeek, TriggerSpec};
    use serde_json::json;

    fn sample_workflow() -> Workflow {
        let trigger = Trigger::new(
            "Daily at 8am",
            TriggerSpec::Time {
                frequency: Some("daily".into()),
                time: "8am".into(),
                enabled_days: DayOfWeek::ALL.to_vec(),
            },
        );
        Workflow::new(
            "Scheduled take vitamins",
            "Auto-generated workflow: every daily at 8am, take vitamins",
            trigger,
            vec![Action::new(
                ActionKind::Reminder,
                json!({"message": "take vitamins", "priority": "medium"}),
            )],
        )
    }

    #[test]
    fn action_kind_uses_snake_case_tags() {
        assert_eq!(
            serde_json::to_value(ActionKind::ApiCall).unwrap(),
            json!("api_call")
        );
        assert_eq!(
            serde_json::to_value(ActionKind::FileOperation).unwrap(),
            json!("file_operation")
        );
        assert_eq!(ActionKind::ApiCall.to_string(), "api_call");
    }

    #[test]
    fn workflow_round_trip_preserves_timestamps() {
        let mut workflow = sample_workflow();
        workflow.run_count = 3;
        workflow.last_run = Some(Utc::now());
        workflow.success_rate = 0.5;

        let json = serde_json::to_string_pretty(&workflow).unwrap();
        let back: Workflow = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, workflow.id);
        assert_eq!(back.created_at, workflow.created_at);
        assert_eq!(back.last_run, workflow.last_run);
        assert_eq!(back.trigger.created_at, workflow.trigger.created_at);
        assert_eq!(back.run_count, 3);
        assert!((back.success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(back.actions.len(), 1);
        assert_eq!(back.actions[0].id, workflow.actions[0].id);
    }

    #[test]
    fn workflow_json_has_stable_field_names() {
        let workflow = sample_workflow();
        let value = serde_json::to_value(&workflow).unwrap();

        assert!(value["trigger"]["trigger_type"].is_string());
        assert!(value["trigger"]["conditions"]["enabled_days"].is_array());
        assert_eq!(value["actions"][0]["action_type"], "reminder");
        assert_eq!(value["actions"][0]["delay_seconds"], 0);
        assert_eq!(value["run_count"], 0);
        assert!(value["last_run"].is_null());
    }

    #[test]
    fn action_defaults_apply_when_fields_missing() {
        let raw = json!({
            "id": Uuid::now_v7(),
            "action_type": "command",
            "parameters": {"command": "turn off notifications"}
        });
        let action: Action = serde_json::from_value(raw).unwrap();
        assert_eq!(action.delay_seconds, 0);
        assert_eq!(action.retry_count, 0);
    }

    #[test]
    fn new_workflow_starts_with_zeroed_stats() {
        let workflow = sample_workflow();
        assert!(workflow.enabled);
        assert_eq!(workflow.run_count, 0);
        assert!(workflow.last_run.is_none());
        assert_eq!(workflow.success_rate, 0.0);
    }
}
