//! Error types for the worker module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from spawning or supervising an external worker process.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Worker binary not found.
    #[error("Worker binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Target directory does not exist and could not be created.
    #[error("Failed to create target directory: {path}")]
    TargetDirFailed { path: PathBuf },

    /// The worker process could not be spawned.
    #[error("Failed to spawn worker: {reason}")]
    SpawnFailed { reason: String },

    /// I/O error while supervising the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Creates a new spawn failed error.
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            reason: reason.into(),
        }
    }
}
