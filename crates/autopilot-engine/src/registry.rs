//! Action dispatch registry.
//!
//! Maps an [`ActionKind`] to the handler that performs its side effect.
//! The registry ships with self-contained handlers for `notification`,
//! `reminder`, and `delay`; `command`, `email`, `api_call`, and
//! `file_operation` must be supplied by the host application.  The
//! executor treats a missing registration as an "unknown action type"
//! failure — the core never implements those side effects itself.
//!
//! Internally the registry is backed by [`DashMap`], making it cheap to
//! clone and safe to share across tasks without a global lock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info};

use autopilot_core::ActionKind;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Handler contract
// ---------------------------------------------------------------------------

/// Outcome reported by an action handler.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    /// A successful outcome with the given message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// A failed outcome with the given message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// A side-effect executor for one action kind.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Perform the side effect described by `params`.
    ///
    /// Returning `Err` is equivalent to a failed outcome: the executor
    /// records the error against the action and continues with the rest of
    /// the workflow.
    async fn execute(&self, params: &Value) -> Result<ActionOutcome>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Concurrent registry of action handlers, keyed by [`ActionKind`].
///
/// Cheaply cloneable (`Arc`-backed) and `Send + Sync`.
#[derive(Clone)]
pub struct ActionRegistry {
    inner: Arc<DashMap<ActionKind, Arc<dyn ActionHandler>>>,
}

impl ActionRegistry {
    /// Create an empty registry with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Create a registry pre-loaded with the self-contained handlers
    /// (`notification`, `reminder`, `delay`).
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(ActionKind::Notification, Arc::new(NotificationHandler));
        registry.register(ActionKind::Reminder, Arc::new(ReminderHandler));
        registry.register(ActionKind::Delay, Arc::new(DelayHandler));
        registry
    }

    /// Register (or replace) the handler for an action kind.
    pub fn register(&self, kind: ActionKind, handler: Arc<dyn ActionHandler>) {
        debug!(action_kind = %kind, "action handler registered");
        self.inner.insert(kind, handler);
    }

    /// Look up the handler for an action kind.
    pub fn get(&self, kind: ActionKind) -> Option<Arc<dyn ActionHandler>> {
        self.inner.get(&kind).map(|entry| Arc::clone(entry.value()))
    }

    /// Kinds that currently have a handler registered.
    pub fn registered_kinds(&self) -> Vec<ActionKind> {
        self.inner.iter().map(|entry| *entry.key()).collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Built-in handlers
// ---------------------------------------------------------------------------

/// Surfaces a titled notification message.
struct NotificationHandler;

#[async_trait]
impl ActionHandler for NotificationHandler {
    async fn execute(&self, params: &Value) -> Result<ActionOutcome> {
        let title = params
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Autopilot");
        let message = params
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        info!(title, message, "notification");
        Ok(ActionOutcome::ok(format!("Notification sent: {title}")))
    }
}

/// Surfaces a reminder message.
struct ReminderHandler;

#[async_trait]
impl ActionHandler for ReminderHandler {
    async fn execute(&self, params: &Value) -> Result<ActionOutcome> {
        let message = params
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        info!(message, "reminder");
        Ok(ActionOutcome::ok(format!("Reminder: {message}")))
    }
}

/// Blocks the run for `params.seconds` (default 1).
struct DelayHandler;

#[async_trait]
impl ActionHandler for DelayHandler {
    async fn execute(&self, params: &Value) -> Result<ActionOutcome> {
        let seconds = params.get("seconds").and_then(Value::as_u64).unwrap_or(1);
        tokio::time::sleep(Duration::from_secs(seconds)).await;
        Ok(ActionOutcome::ok(format!("Delayed for {seconds} seconds")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
