//! Core data model for Autopilot.
//!
//! This crate provides:
//!
//! - **Workflow model**: [`Workflow`], [`Action`], and the run-log
//!   [`RunRecord`] aggregate types.
//! - **Triggers**: [`Trigger`] / [`TriggerSpec`] with the evaluation logic
//!   the scheduler polls, plus the day and time-of-day vocabulary.
//! - **Clock parsing**: [`parse_clock`] for the `8am` / `2:30pm` / `14:00`
//!   forms time triggers use.

pub mod clock;
pub mod error;
pub mod trigger;
pub mod workflow;

pub use clock::parse_clock;
pub use error::{CoreError, Result};
pub use trigger::{
    DayOfWeek, MATCH_WINDOW_SECS, TimeOfDay, Trigger, TriggerSpec, frequency_to_days,
};
pub use workflow::{Action, ActionKind, RunRecord, Workflow};
