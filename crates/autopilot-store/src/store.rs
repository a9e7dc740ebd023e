//! JSON-file persistence for the workflow collection and run log.
//!
//! Two files live under the data directory: `workflows.json` (the full
//! workflow collection, rewritten on every save) and `automation_log.json`
//! (the run log, capped at [`LOG_CAP`] entries with the oldest evicted
//! first).  Timestamps round-trip losslessly as RFC 3339 strings.
//!
//! Load failures are not surfaced to callers: a missing or corrupt file
//! yields an empty collection, so the system degrades to "no workflows"
//! instead of refusing to start.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use autopilot_core::{RunRecord, Workflow};

use crate::error::StoreResult;

/// Maximum number of run records retained in the log.
pub const LOG_CAP: usize = 1000;

const WORKFLOWS_FILE: &str = "workflows.json";
const LOG_FILE: &str = "automation_log.json";

/// Durable JSON-file store for workflows and the run log.
///
/// Cheap to clone; holds only the resolved file paths.
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    workflows_path: PathBuf,
    log_path: PathBuf,
}

impl WorkflowStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            workflows_path: data_dir.join(WORKFLOWS_FILE),
            log_path: data_dir.join(LOG_FILE),
        })
    }

    /// Load the workflow collection, empty when the file is missing or
    /// unreadable.
    pub fn load(&self) -> Vec<Workflow> {
        load_json(&self.workflows_path, "workflows")
    }

    /// Persist the whole workflow collection.
    pub fn save(&self, workflows: &[Workflow]) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(workflows)?;
        fs::write(&self.workflows_path, json)?;
        debug!(
            count = workflows.len(),
            path = %self.workflows_path.display(),
            "workflows saved"
        );
        Ok(())
    }

    /// Append one record to the run log, enforcing the retention cap.
    pub fn append_record(&self, record: RunRecord) -> StoreResult<()> {
        let mut log = self.load_log();
        log.push(record);
        if log.len() > LOG_CAP {
            let excess = log.len() - LOG_CAP;
            log.drain(..excess);
        }

        let json = serde_json::to_string_pretty(&log)?;
        fs::write(&self.log_path, json)?;
        Ok(())
    }

    /// Load the run log, empty when the file is missing or unreadable.
    pub fn load_log(&self) -> Vec<RunRecord> {
        load_json(&self.log_path, "automation log")
    }

    /// Run records newer than `since`, for status reporting.
    pub fn recent_records(&self, since: DateTime<Utc>) -> Vec<RunRecord> {
        self.load_log()
            .into_iter()
            .filter(|record| record.timestamp > since)
            .collect()
    }
}

/// Read and deserialize a JSON array, degrading to empty on any failure.
fn load_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Vec<T> {
    if !path.exists() {
        return Vec::new();
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read {what}; starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse {what}; starting empty");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
