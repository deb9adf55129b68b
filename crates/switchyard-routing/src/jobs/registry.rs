//! The authoritative store for job state.
//!
//! Every mutation goes through an operation on [`JobRegistry`]; the raw map
//! is never exposed. Each operation takes the lock for one short critical
//! section, so per-key mutations are atomic and reads are snapshots that
//! never hold the lock across a request.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;

use crate::error::{Result, RoutingError};
use crate::types::{CancelOutcome, Job, JobId, JobStatus};

/// Single source of truth for the state of every dispatched task.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the map, recovering from poisoning: the panic that poisoned
    /// the lock is the interesting failure, not the poisoned state itself.
    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a job in `Queued` state with zero progress.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::DuplicateJob`] if a job with this id already
    /// exists.
    pub fn create_job(&self, id: JobId, task: &str, model: &str) -> Result<Job> {
        let mut jobs = self.lock();
        if jobs.contains_key(&id) {
            return Err(RoutingError::DuplicateJob(id));
        }

        let now = Utc::now();
        let job = Job {
            id,
            task: task.to_owned(),
            model: model.to_owned(),
            status: JobStatus::Queued,
            progress: 0,
            created_at: now,
            updated_at: now,
            results: Vec::new(),
            error: None,
        };
        jobs.insert(id, job.clone());
        tracing::debug!(%id, model, "job created");
        Ok(job)
    }

    /// Records progress for a running job.
    ///
    /// Progress is clamped to `[0, 100]` and never moves backwards. A
    /// positive update promotes a `Queued` job to `InProgress`. Updates for
    /// missing or terminal jobs are logged and ignored.
    pub fn update_progress(&self, id: JobId, progress: u8, eta_ms: Option<u64>) {
        let mut jobs = self.lock();
        let Some(job) = jobs.get_mut(&id) else {
            tracing::warn!(%id, "progress update for unknown job ignored");
            return;
        };
        if job.status.is_terminal() {
            tracing::warn!(%id, status = %job.status, "progress update for terminal job ignored");
            return;
        }

        let clamped = progress.min(100);
        if job.status == JobStatus::Queued && clamped > 0 {
            job.status = JobStatus::InProgress;
        }
        job.progress = job.progress.max(clamped);
        job.updated_at = Utc::now();
        tracing::debug!(%id, progress = job.progress, ?eta_ms, "job progress");
    }

    /// Marks a job completed with its outputs. No-op if already terminal.
    pub fn complete(&self, id: JobId, results: Vec<String>) {
        let mut jobs = self.lock();
        let Some(job) = jobs.get_mut(&id) else {
            tracing::warn!(%id, "completion for unknown job ignored");
            return;
        };
        if job.status.is_terminal() {
            tracing::warn!(%id, status = %job.status, "completion for terminal job ignored");
            return;
        }

        job.status = JobStatus::Completed;
        job.progress = 100;
        job.results = results;
        job.updated_at = Utc::now();
        tracing::info!(%id, "job completed");
    }

    /// Marks a job failed with a message. No-op if already terminal.
    pub fn fail(&self, id: JobId, message: &str) {
        let mut jobs = self.lock();
        let Some(job) = jobs.get_mut(&id) else {
            tracing::warn!(%id, "failure for unknown job ignored");
            return;
        };
        if job.status.is_terminal() {
            tracing::warn!(%id, status = %job.status, "failure for terminal job ignored");
            return;
        }

        job.status = JobStatus::Failed;
        job.error = Some(message.to_owned());
        job.updated_at = Utc::now();
        tracing::warn!(%id, message, "job failed");
    }

    /// Cancels a job that has not yet finished.
    ///
    /// Returns an explicit verdict so callers can tell "cancelled" apart
    /// from "could not cancel because already done".
    pub fn cancel(&self, id: JobId) -> CancelOutcome {
        let mut jobs = self.lock();
        let Some(job) = jobs.get_mut(&id) else {
            return CancelOutcome::NotFound;
        };
        if job.status.is_terminal() {
            return CancelOutcome::AlreadyTerminal(job.status);
        }

        job.status = JobStatus::Cancelled;
        job.updated_at = Utc::now();
        tracing::info!(%id, "job cancelled");
        CancelOutcome::Cancelled
    }

    /// Snapshot of one job.
    #[must_use]
    pub fn get(&self, id: JobId) -> Option<Job> {
        self.lock().get(&id).cloned()
    }

    /// Snapshot of all jobs still queued or running, oldest first.
    #[must_use]
    pub fn list_active(&self) -> Vec<Job> {
        let jobs = self.lock();
        let mut active: Vec<Job> = jobs
            .values()
            .filter(|job| !job.status.is_terminal())
            .cloned()
            .collect();
        drop(jobs);
        active.sort_by_key(|job| job.created_at);
        active
    }

    /// Evicts terminal jobs whose last update is older than the retention
    /// window. Returns how many were removed.
    pub fn sweep(&self, retention: Duration) -> usize {
        let Ok(retention) = chrono::Duration::from_std(retention) else {
            tracing::warn!("retention window out of range, sweep skipped");
            return 0;
        };
        let cutoff = Utc::now() - retention;

        let mut jobs = self.lock();
        let before = jobs.len();
        jobs.retain(|_, job| !(job.status.is_terminal() && job.updated_at < cutoff));
        let removed = before - jobs.len();
        drop(jobs);

        if removed > 0 {
            tracing::debug!(removed, "evicted old terminal jobs");
        }
        removed
    }

    /// Number of jobs currently tracked, terminal or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
