//! Core error types.
//!
//! The model crate surfaces errors through [`CoreError`].  Trigger
//! evaluation deliberately swallows these (an unparseable clock string
//! makes a trigger that never fires, not a crashing scheduler); they are
//! only returned from APIs the caller invoked directly.

/// Unified error type for the core model crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A clock string could not be parsed (accepted forms: `8am`,
    /// `2:30pm`, `14:00`).
    #[error("cannot parse clock time `{input}`")]
    InvalidClock { input: String },

    /// A token is not a weekday name.
    #[error("unknown day of week `{input}`")]
    UnknownDay { input: String },

    /// A token is not a time-of-day bucket.
    #[error("unknown time of day `{input}`")]
    UnknownTimeOfDay { input: String },
}

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
