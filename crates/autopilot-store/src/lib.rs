//! # autopilot-store
//!
//! JSON-file persistence for Autopilot.
//!
//! The store owns two files under a data directory:
//!
//! - `workflows.json` — the workflow collection, rewritten on save.
//! - `automation_log.json` — the run log, capped at 1000 entries with
//!   FIFO eviction.
//!
//! Loads degrade to empty collections on missing or corrupt files; saves
//! surface [`StoreError`] so callers can apply the log-and-continue policy
//! at the boundary that owns the operation.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{LOG_CAP, WorkflowStore};
