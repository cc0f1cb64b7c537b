//! Trait definitions for the worker module.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use super::error::WorkerError;

/// Cloneable switch that terminates a worker process from another task.
pub type ProcessKiller = Arc<dyn KillSwitch>;

/// Terminates the underlying process if it is still alive.
#[async_trait]
pub trait KillSwitch: Send + Sync {
    /// Sends a hard termination to the process. Idempotent; terminating an
    /// already-exited process is a no-op.
    async fn kill(&self);
}

/// A running worker process with a line-oriented status feed.
#[async_trait]
pub trait WorkerProcess: Send + std::fmt::Debug {
    /// Next line of combined output; `None` once the stream closes. The
    /// stream is finite and not restartable.
    async fn next_line(&mut self) -> Option<String>;

    /// Waits for the process to exit; `Ok(true)` on exit code 0.
    async fn wait(&mut self) -> Result<bool, WorkerError>;

    /// Kill switch usable while `next_line`/`wait` are in flight elsewhere.
    fn killer(&self) -> ProcessKiller;
}

/// A downloader backend that spawns one external process per job.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Returns the name of this worker implementation.
    fn name(&self) -> &str;

    /// Checks that the worker binary is present and runnable.
    async fn validate(&self) -> Result<(), WorkerError>;

    /// Spawns one worker process downloading `source` into `target_dir`,
    /// creating the directory recursively if absent.
    async fn spawn(
        &self,
        source: &str,
        target_dir: &Path,
    ) -> Result<Box<dyn WorkerProcess>, WorkerError>;
}
