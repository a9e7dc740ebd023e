//! Error types for the autopilot-store crate.
//!
//! All storage operations return [`StoreError`] via [`StoreResult`].
//! Load paths deliberately do not: a missing or corrupt data file degrades
//! to an empty collection so the automation system keeps running.

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while persisting workflows or the run log.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a data file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
