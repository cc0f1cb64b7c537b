//! Per-job monitoring task.
//!
//! One task owns one worker process from spawn to terminal state and is the
//! only writer to its registry slot, so per-job updates never collide across
//! jobs. Progress events are applied in the order the worker emitted them.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::progress::{parse_line, SpeedTracker};
use crate::worker::Worker;

use super::registry::JobRegistry;
use super::types::{JobState, STATUS_COMPLETE, STATUS_ERROR};

pub(super) async fn run_job(
    worker: Arc<dyn Worker>,
    registry: Arc<RwLock<JobRegistry>>,
    slot: usize,
    source: String,
    target_dir: PathBuf,
) {
    let mut process = match worker.spawn(&source, &target_dir).await {
        Ok(process) => process,
        Err(e) => {
            // Fatal for this job only; the rest of the batch is unaffected.
            warn!(slot, error = %e, "worker spawn failed");
            let mut reg = registry.write().await;
            if let Some(job) = reg.get_mut(slot) {
                job.state = JobState::Failed;
                job.speed = STATUS_ERROR.to_string();
                job.diagnostic = Some(e.to_string());
            }
            return;
        }
    };

    {
        let mut reg = registry.write().await;
        match reg.get_mut(slot) {
            Some(job) if job.state == JobState::Pending => {
                job.killer = Some(process.killer());
                job.state = JobState::Running;
            }
            _ => {
                // A stop, pause or removal won the race against the spawn;
                // tear the process straight back down and keep the commanded
                // state.
                process.killer().kill().await;
                let _ = process.wait().await;
                return;
            }
        }
    }

    let mut tracker = SpeedTracker::new();
    let mut last_output = None;
    while let Some(line) = process.next_line().await {
        match parse_line(&line) {
            Some(event) => {
                debug!(slot, percent = event.percent, "progress");
                let mut reg = registry.write().await;
                if let Some(job) = reg.get_mut(slot) {
                    job.percent = event.percent;
                    if let Some(speed) = tracker.update(&event) {
                        job.speed = speed;
                    }
                }
            }
            None => {
                if !line.trim().is_empty() {
                    last_output = Some(line);
                }
            }
        }
    }

    let exited_ok = match process.wait().await {
        Ok(ok) => ok,
        Err(e) => {
            last_output = Some(e.to_string());
            false
        }
    };

    let mut reg = registry.write().await;
    let Some(job) = reg.get_mut(slot) else { return };
    job.killer = None;
    match job.state {
        // A commanded pause or stop wins over the observed exit status.
        JobState::Paused | JobState::Stopped => {}
        _ if exited_ok => {
            job.state = JobState::Completed;
            job.percent = 100.0;
            job.speed = STATUS_COMPLETE.to_string();
            info!(slot, source = %job.source, "download completed");
        }
        _ => {
            job.state = JobState::Failed;
            job.speed = STATUS_ERROR.to_string();
            if job.diagnostic.is_none() {
                job.diagnostic = last_output;
            }
            info!(slot, source = %job.source, "download failed");
        }
    }
}
