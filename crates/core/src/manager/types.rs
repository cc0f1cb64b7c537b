//! Types for the download manager.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Displayed status once a job finishes cleanly.
pub const STATUS_COMPLETE: &str = "Complete";
/// Displayed status once a job fails.
pub const STATUS_ERROR: &str = "Error occurred";
/// Displayed status once a job is stopped.
pub const STATUS_STOPPED: &str = "Stopped";

/// Lifecycle state of a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created, worker not yet spawned.
    Pending,
    /// Worker process is downloading.
    Running,
    /// Hard-terminated by a pause; a resume restarts from scratch.
    Paused,
    /// Terminated by an explicit stop.
    Stopped,
    /// Worker exited with code 0.
    Completed,
    /// Worker failed to spawn or exited non-zero.
    Failed,
}

impl JobState {
    /// Returns the string representation for API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Paused => "paused",
            JobState::Stopped => "stopped",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    /// Whether no further transitions can occur for this job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Stopped | JobState::Completed | JobState::Failed
        )
    }
}

/// Point-in-time view of one job, safe to hand to a presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Stable slot index within the batch.
    pub slot: usize,
    /// Source URL.
    pub source: String,
    /// Current lifecycle state.
    pub state: JobState,
    /// Completion percentage, 0-100.
    pub percent: f64,
    /// Last displayed transfer rate or status marker.
    pub speed: String,
    /// Raw last worker output for failed jobs, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Errors from the download manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The batch target directory could not be created; no job was started.
    #[error("Failed to create target directory {path}: {source}")]
    TargetDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_strings() {
        assert_eq!(JobState::Running.as_str(), "running");
        assert_eq!(JobState::Failed.as_str(), "failed");
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Stopped.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::Paused.is_terminal());
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = JobSnapshot {
            slot: 0,
            source: "https://example.com/v".to_string(),
            state: JobState::Running,
            percent: 42.5,
            speed: "1.20 Mbps".to_string(),
            diagnostic: None,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["state"], "running");
        assert_eq!(value["percent"], 42.5);
        assert!(value.get("diagnostic").is_none());
    }
}
