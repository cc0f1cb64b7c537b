//! Slot-indexed registry of download jobs.

use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::task::JoinHandle;

use crate::worker::ProcessKiller;

use super::types::{JobSnapshot, JobState};

/// One tracked download job.
///
/// Mutated only by its own monitoring task and by manager-issued commands;
/// at most one live worker process exists per job at any time.
pub struct Job {
    /// Stable slot index within the batch.
    pub slot: usize,
    /// Source URL.
    pub source: String,
    /// Directory the worker downloads into.
    pub target_dir: PathBuf,
    /// Current lifecycle state.
    pub state: JobState,
    /// Completion percentage, 0-100.
    pub percent: f64,
    /// Last displayed transfer rate or status marker.
    pub speed: String,
    /// Raw last worker output for failed jobs.
    pub diagnostic: Option<String>,
    /// Kill switch for the live worker process, present only while one exists.
    pub(super) killer: Option<ProcessKiller>,
    /// Monitoring task handle, taken by whoever joins it.
    pub(super) monitor: Option<JoinHandle<()>>,
}

impl Job {
    pub(super) fn pending(slot: usize, source: String, target_dir: PathBuf) -> Self {
        Self {
            slot,
            source,
            target_dir,
            state: JobState::Pending,
            percent: 0.0,
            speed: String::new(),
            diagnostic: None,
            killer: None,
            monitor: None,
        }
    }

    /// Cloneable view of the job.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            slot: self.slot,
            source: self.source.clone(),
            state: self.state,
            percent: self.percent,
            speed: self.speed.clone(),
            diagnostic: self.diagnostic.clone(),
        }
    }
}

/// Ordered mapping from slot index to job.
///
/// Insertion order is submission order and slot indices are never reused
/// within a batch. The registry is not internally synchronized: the manager
/// owns it behind a lock and each monitoring task only writes its own slot.
#[derive(Default)]
pub struct JobRegistry {
    jobs: BTreeMap<usize, Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: usize, job: Job) {
        self.jobs.insert(slot, job);
    }

    pub fn get(&self, slot: usize) -> Option<&Job> {
        self.jobs.get(&slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Job> {
        self.jobs.get_mut(&slot)
    }

    pub fn remove(&mut self, slot: usize) -> Option<Job> {
        self.jobs.remove(&slot)
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Job)> {
        self.jobs.iter().map(|(slot, job)| (*slot, job))
    }

    /// Slot indices currently present, in order.
    pub(super) fn slots(&self) -> Vec<usize> {
        self.jobs.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(slot: usize) -> Job {
        Job::pending(slot, format!("https://example.com/{slot}"), "dl".into())
    }

    #[test]
    fn test_iteration_follows_slot_order() {
        let mut registry = JobRegistry::new();
        registry.set(1, job(1));
        registry.set(0, job(0));
        registry.set(2, job(2));

        let slots: Vec<usize> = registry.iter().map(|(slot, _)| slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_keeps_other_slots_stable() {
        let mut registry = JobRegistry::new();
        registry.set(0, job(0));
        registry.set(1, job(1));

        assert!(registry.remove(0).is_some());
        assert!(registry.get(0).is_none());
        assert_eq!(registry.get(1).unwrap().slot, 1);
        assert!(registry.remove(0).is_none());
    }

    #[test]
    fn test_clear() {
        let mut registry = JobRegistry::new();
        registry.set(0, job(0));
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_new_job_snapshot_defaults() {
        let snapshot = job(3).snapshot();
        assert_eq!(snapshot.slot, 3);
        assert_eq!(snapshot.state, JobState::Pending);
        assert_eq!(snapshot.percent, 0.0);
        assert!(snapshot.speed.is_empty());
        assert!(snapshot.diagnostic.is_none());
    }
}
