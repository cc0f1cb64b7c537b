//! Download manager: coordinates one monitoring task per job.
//!
//! A batch of sources becomes one job per source, each driven by its own
//! worker process and monitoring task. The manager serializes all registry
//! mutations through per-slot updates, so concurrently progressing jobs never
//! interfere with each other, and `stop` joins the monitoring task before
//! returning so no late writes can land on a stopped slot.

mod registry;
mod runner;
mod types;

pub use registry::{Job, JobRegistry};
pub use types::{
    JobSnapshot, JobState, ManagerError, STATUS_COMPLETE, STATUS_ERROR, STATUS_STOPPED,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::worker::{Worker, WorkerError, YtdlpWorker};

/// Orchestrates a batch of concurrent download jobs.
pub struct DownloadManager {
    worker: Arc<dyn Worker>,
    registry: Arc<RwLock<JobRegistry>>,
}

impl DownloadManager {
    /// Creates a manager driving the given worker backend.
    pub fn new(worker: Arc<dyn Worker>) -> Self {
        Self {
            worker,
            registry: Arc::new(RwLock::new(JobRegistry::new())),
        }
    }

    /// Creates a manager driving yt-dlp with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(YtdlpWorker::with_defaults()))
    }

    /// Preflight check that the worker tool is available.
    pub async fn validate(&self) -> Result<(), WorkerError> {
        self.worker.validate().await
    }

    /// Replaces the current batch with one job per source, in order.
    ///
    /// Live jobs from the previous batch are stopped and joined before the
    /// registry is rebuilt, so no in-flight monitor can write into the new
    /// batch. Returns once every monitoring task is launched; completion is
    /// observed through [`DownloadManager::job`] and
    /// [`DownloadManager::jobs`], not through a batch-level join.
    ///
    /// Failure to create `target_dir` aborts the whole call before any job
    /// starts; per-job spawn failures only fail their own job.
    pub async fn submit(
        &self,
        sources: Vec<String>,
        target_dir: impl AsRef<Path>,
    ) -> Result<(), ManagerError> {
        let target_dir = target_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(|source| ManagerError::TargetDirFailed {
                path: target_dir.clone(),
                source,
            })?;

        let slots = self.registry.read().await.slots();
        for slot in slots {
            self.stop(slot).await;
        }
        self.registry.write().await.clear();

        info!(count = sources.len(), dir = %target_dir.display(), "submitting batch");
        for (slot, source) in sources.into_iter().enumerate() {
            self.registry
                .write()
                .await
                .set(slot, Job::pending(slot, source.clone(), target_dir.clone()));
            self.spawn_monitor(slot, source, target_dir.clone()).await;
        }
        Ok(())
    }

    async fn spawn_monitor(&self, slot: usize, source: String, target_dir: PathBuf) {
        let handle = tokio::spawn(runner::run_job(
            self.worker.clone(),
            self.registry.clone(),
            slot,
            source,
            target_dir,
        ));
        let mut registry = self.registry.write().await;
        if let Some(job) = registry.get_mut(slot) {
            job.monitor = Some(handle);
        }
    }

    /// Pauses a job by hard-terminating its worker process.
    ///
    /// There is no cooperative suspend: a later [`DownloadManager::resume`]
    /// restarts the download from scratch. No-op for stale slots and jobs
    /// that already settled.
    pub async fn pause(&self, slot: usize) {
        let killer = {
            let mut registry = self.registry.write().await;
            let Some(job) = registry.get_mut(slot) else {
                debug!(slot, "pause on unknown slot ignored");
                return;
            };
            if job.state != JobState::Running && job.state != JobState::Pending {
                return;
            }
            job.state = JobState::Paused;
            job.killer.take()
        };
        if let Some(killer) = killer {
            killer.kill().await;
        }
        info!(slot, "job paused");
    }

    /// Restarts a paused job from scratch with the same source and directory.
    ///
    /// The worker tool may reuse its own partial files, but no byte offset is
    /// tracked here. No-op unless the job is currently paused.
    pub async fn resume(&self, slot: usize) {
        let monitor = {
            let mut registry = self.registry.write().await;
            let Some(job) = registry.get_mut(slot) else {
                debug!(slot, "resume on unknown slot ignored");
                return;
            };
            if job.state != JobState::Paused {
                return;
            }
            job.monitor.take()
        };

        // The previous monitor must be fully gone before a second worker may
        // exist for this slot.
        if let Some(monitor) = monitor {
            let _ = monitor.await;
        }

        let (source, target_dir) = {
            let mut registry = self.registry.write().await;
            let Some(job) = registry.get_mut(slot) else { return };
            if job.state != JobState::Paused {
                return;
            }
            job.state = JobState::Pending;
            job.killer = None;
            (job.source.clone(), job.target_dir.clone())
        };

        info!(slot, "job resumed");
        self.spawn_monitor(slot, source, target_dir).await;
    }

    /// Stops a job: terminates its worker process and joins the monitoring
    /// task, so no further updates can land on the slot after this returns.
    ///
    /// Idempotent; no-op for stale slots and jobs that already settled.
    pub async fn stop(&self, slot: usize) {
        let (killer, monitor) = {
            let mut registry = self.registry.write().await;
            let Some(job) = registry.get_mut(slot) else {
                debug!(slot, "stop on unknown slot ignored");
                return;
            };
            if job.state.is_terminal() {
                return;
            }
            job.state = JobState::Stopped;
            job.speed = STATUS_STOPPED.to_string();
            (job.killer.take(), job.monitor.take())
        };
        if let Some(killer) = killer {
            killer.kill().await;
        }
        if let Some(monitor) = monitor {
            let _ = monitor.await;
        }
        info!(slot, "job stopped");
    }

    /// Stops the job and drops it from the registry.
    ///
    /// Removal always stops first: letting a live process keep updating a
    /// hidden slot would leak the process.
    pub async fn remove(&self, slot: usize) {
        self.stop(slot).await;
        let mut registry = self.registry.write().await;
        if registry.remove(slot).is_some() {
            info!(slot, "job removed");
        }
    }

    /// Snapshot of one job, if the slot exists.
    pub async fn job(&self, slot: usize) -> Option<JobSnapshot> {
        self.registry.read().await.get(slot).map(Job::snapshot)
    }

    /// Snapshots of all jobs in slot order.
    pub async fn jobs(&self) -> Vec<JobSnapshot> {
        self.registry
            .read()
            .await
            .iter()
            .map(|(_, job)| job.snapshot())
            .collect()
    }
}
