//! In-memory job registry.
//!
//! One registry instance exists per job kind. Records are mutated only by
//! the background routine that owns the job and read concurrently by status
//! queries, so the map sits behind a `RwLock` and every mutation is visible
//! to the next read.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use reel_models::JobId;

/// Status lifecycle shared by every job kind.
pub trait Lifecycle: Copy + PartialEq + Debug + Send + Sync {
    /// Position in the lifecycle; a job may only move to a higher rank.
    fn rank(&self) -> u8;

    /// No further transitions are allowed from a terminal status.
    fn is_terminal(&self) -> bool;

    fn label(&self) -> &'static str;
}

/// A record that can be stored in a [`JobRegistry`].
pub trait TrackedJob: Clone + Send + Sync + 'static {
    type Status: Lifecycle;

    fn id(&self) -> &JobId;
    fn status(&self) -> Self::Status;
    fn created_at(&self) -> DateTime<Utc>;
}

/// Object-safe sweep handle so the periodic sweeper can hold every
/// registry regardless of its job type.
pub trait Sweep: Send + Sync {
    fn name(&self) -> &str;
    fn sweep(&self, max_age: Duration) -> usize;
}

/// Create/get/update/list/sweep store for one job kind.
pub struct JobRegistry<J: TrackedJob> {
    name: String,
    jobs: RwLock<HashMap<JobId, J>>,
}

impl<J: TrackedJob> JobRegistry<J> {
    /// Create an empty registry. `name` is used only in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    // A panic inside an update closure must not take the registry down with it.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, J>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, J>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a freshly created job and return a snapshot of it.
    pub fn create(&self, job: J) -> J {
        info!(
            registry = %self.name,
            job_id = %job.id(),
            status = job.status().label(),
            "Job created"
        );
        self.write().insert(job.id().clone(), job.clone());
        job
    }

    /// Snapshot of a job, if it exists.
    pub fn get(&self, id: &JobId) -> Option<J> {
        self.read().get(id).cloned()
    }

    /// Apply `mutate` to the stored job.
    ///
    /// Returns `false` without touching the record when the id is unknown
    /// (update never creates) or when the mutation would move the status
    /// backwards or out of a terminal state.
    pub fn update<F>(&self, id: &JobId, mutate: F) -> bool
    where
        F: FnOnce(&mut J),
    {
        let mut jobs = self.write();

        let Some(current) = jobs.get(id) else {
            warn!(registry = %self.name, job_id = %id, "Attempted to update non-existent job");
            return false;
        };

        let before = current.status();
        let mut next = current.clone();
        mutate(&mut next);
        let after = next.status();

        if after != before && (before.is_terminal() || after.rank() < before.rank()) {
            warn!(
                registry = %self.name,
                job_id = %id,
                from = before.label(),
                to = after.label(),
                "Rejected non-monotonic status transition"
            );
            return false;
        }

        if after != before {
            debug!(
                registry = %self.name,
                job_id = %id,
                from = before.label(),
                to = after.label(),
                "Job status changed"
            );
        }

        jobs.insert(id.clone(), next);
        true
    }

    /// Snapshot of every job.
    pub fn list(&self) -> Vec<J> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove every job created strictly before `cutoff`, regardless of status.
    pub fn sweep_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, job| job.created_at() >= cutoff);
        before - jobs.len()
    }

    /// Remove every job older than `now - max_age`. Returns the number removed.
    pub fn sweep(&self, max_age: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age));

        match cutoff {
            Some(cutoff) => self.sweep_before(cutoff),
            // Cutoff predates any representable timestamp: nothing is that old.
            None => 0,
        }
    }
}

impl<J: TrackedJob> Sweep for JobRegistry<J> {
    fn name(&self) -> &str {
        &self.name
    }

    fn sweep(&self, max_age: Duration) -> usize {
        JobRegistry::sweep(self, max_age)
    }
}
