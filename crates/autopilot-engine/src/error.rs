//! Engine error types.
//!
//! All engine subsystems surface errors through [`EngineError`].  Note the
//! boundaries where errors deliberately stop propagating: action failures
//! are recorded per action and execution continues, and the host-facing
//! workflow-creation API returns a structured outcome rather than an error.

use uuid::Uuid;

/// Unified error type for the automation engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A rule-recognizer pattern failed to compile.
    #[error("invalid rule pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The referenced workflow does not exist.
    #[error("workflow not found: {workflow_id}")]
    WorkflowNotFound { workflow_id: Uuid },

    /// An action handler reported a hard failure.
    #[error("action handler failed: {0}")]
    Handler(String),

    /// An error propagated from the store crate.
    #[error("store error: {0}")]
    Store(#[from] autopilot_store::StoreError),

    /// An error propagated from the core model crate.
    #[error("core error: {0}")]
    Core(#[from] autopilot_core::CoreError),

    /// Catch-all for unexpected internal errors.
    #[error("internal engine error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;
