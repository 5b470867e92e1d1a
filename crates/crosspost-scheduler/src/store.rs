//! The job-store port and its in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::{Job, JobState, SchedulerError};

/// Delay-aware job storage keyed by the job's idempotency key.
///
/// The store enforces the core invariant: at most one live job per key.
/// Inserting over a live job is rejected; a job in the failed set may be
/// overwritten, since it can no longer dispatch.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job. Rejects the key if a live job already holds it.
    async fn insert(&self, job: Job) -> Result<(), SchedulerError>;

    /// Atomically replace whatever job holds this key (remove-then-add with
    /// no window in which two jobs exist).
    async fn replace(&self, job: Job) -> Result<(), SchedulerError>;

    /// Remove a job. Returns whether one existed.
    async fn remove(&self, key: &str) -> Result<bool, SchedulerError>;

    async fn get(&self, key: &str) -> Result<Option<Job>, SchedulerError>;

    /// Write back an updated job (retry scheduling, failure marking).
    async fn update(&self, job: Job) -> Result<(), SchedulerError>;

    /// Claim every due job: atomically mark it active and return it.
    async fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<Job>, SchedulerError>;

    /// Due time of the nearest waiting job, if any.
    async fn next_due_at(&self) -> Result<Option<DateTime<Utc>>, SchedulerError>;

    /// All waiting jobs.
    async fn pending(&self) -> Result<Vec<Job>, SchedulerError>;

    /// Remove up to `limit` failed jobs older than `cutoff`. Returns how
    /// many were removed; callers drain by looping until a short batch.
    async fn clean_failed(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, SchedulerError>;
}

/// Jobs in a concurrent map. The queue is a derived accelerator: losing it
/// is recoverable by rebuilding from the Post table on startup.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: DashMap<String, Job>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: Job) -> Result<(), SchedulerError> {
        match self.jobs.entry(job.key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live() {
                    return Err(SchedulerError::JobExists(job.key));
                }
                occupied.insert(job);
                Ok(())
            }
            Entry::Vacant(vacant) => {
                vacant.insert(job);
                Ok(())
            }
        }
    }

    async fn replace(&self, job: Job) -> Result<(), SchedulerError> {
        self.jobs.insert(job.key.clone(), job);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, SchedulerError> {
        Ok(self.jobs.remove(key).is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<Job>, SchedulerError> {
        Ok(self.jobs.get(key).map(|j| j.clone()))
    }

    async fn update(&self, job: Job) -> Result<(), SchedulerError> {
        match self.jobs.entry(job.key.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(job);
                Ok(())
            }
            Entry::Vacant(_) => Err(SchedulerError::JobNotFound(job.key)),
        }
    }

    async fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<Job>, SchedulerError> {
        let mut claimed = Vec::new();
        for mut entry in self.jobs.iter_mut() {
            if entry.is_due(now) {
                entry.state = JobState::Active;
                claimed.push(entry.clone());
            }
        }
        claimed.sort_by_key(|j| j.due_at);
        Ok(claimed)
    }

    async fn next_due_at(&self) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        Ok(self
            .jobs
            .iter()
            .filter(|j| j.state == JobState::Delayed)
            .map(|j| j.due_at)
            .min())
    }

    async fn pending(&self) -> Result<Vec<Job>, SchedulerError> {
        let mut pending: Vec<Job> = self
            .jobs
            .iter()
            .filter(|j| j.state == JobState::Delayed)
            .map(|j| j.clone())
            .collect();
        pending.sort_by_key(|j| j.due_at);
        Ok(pending)
    }

    async fn clean_failed(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, SchedulerError> {
        let stale: Vec<String> = self
            .jobs
            .iter()
            .filter(|j| {
                j.state == JobState::Failed && j.failed_at.is_some_and(|at| at < cutoff)
            })
            .take(limit)
            .map(|j| j.key.clone())
            .collect();

        let mut removed = 0;
        for key in stale {
            if self.jobs.remove(&key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn job_due(post_id: &str, offset_secs: i64) -> Job {
        Job::new(post_id, "owner", Utc::now() + Duration::seconds(offset_secs))
    }

    #[tokio::test]
    async fn test_duplicate_live_job_rejected() {
        let store = InMemoryJobStore::new();
        store.insert(job_due("p1", 60)).await.unwrap();

        let err = store.insert(job_due("p1", 120)).await.unwrap_err();
        assert!(matches!(err, SchedulerError::JobExists(_)));
    }

    #[tokio::test]
    async fn test_failed_job_can_be_overwritten() {
        let store = InMemoryJobStore::new();
        let mut failed = job_due("p1", -60);
        failed.state = JobState::Failed;
        failed.failed_at = Some(Utc::now());
        store.insert(failed).await.unwrap();

        // A fresh schedule for the same post replaces the dead record.
        store.insert(job_due("p1", 60)).await.unwrap();
        let job = store.get("post-p1").await.unwrap().unwrap();
        assert_eq!(job.state, JobState::Delayed);
    }

    #[tokio::test]
    async fn test_replace_leaves_exactly_one_job() {
        let store = InMemoryJobStore::new();
        store.insert(job_due("p1", 60)).await.unwrap();
        store.replace(job_due("p1", 3600)).await.unwrap();

        let pending = store.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].due_at > Utc::now() + Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_claim_due_marks_active() {
        let store = InMemoryJobStore::new();
        store.insert(job_due("due", -5)).await.unwrap();
        store.insert(job_due("later", 3600)).await.unwrap();

        let claimed = store.claim_due(Utc::now()).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].post_id, "due");
        assert_eq!(claimed[0].state, JobState::Active);

        // A second claim finds nothing: the job is no longer delayed.
        assert!(store.claim_due(Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_next_due_at_ignores_non_delayed() {
        let store = InMemoryJobStore::new();
        let mut active = job_due("active", -10);
        active.state = JobState::Active;
        store.insert(active).await.unwrap();
        store.insert(job_due("later", 600)).await.unwrap();

        let next = store.next_due_at().await.unwrap().unwrap();
        assert!(next > Utc::now() + Duration::seconds(590));
    }

    #[tokio::test]
    async fn test_clean_failed_respects_cutoff_and_limit() {
        let store = InMemoryJobStore::new();
        for i in 0..5 {
            let mut job = job_due(&format!("p{i}"), -3600);
            job.state = JobState::Failed;
            job.failed_at = Some(Utc::now() - Duration::hours(48));
            store.insert(job).await.unwrap();
        }
        let mut recent = job_due("recent", -3600);
        recent.state = JobState::Failed;
        recent.failed_at = Some(Utc::now() - Duration::hours(1));
        store.insert(recent).await.unwrap();

        let cutoff = Utc::now() - Duration::hours(24);
        assert_eq!(store.clean_failed(cutoff, 3).await.unwrap(), 3);
        assert_eq!(store.clean_failed(cutoff, 3).await.unwrap(), 2);
        assert_eq!(store.clean_failed(cutoff, 3).await.unwrap(), 0);

        // The recent failure stays inside its retention window.
        assert!(store.get("post-recent").await.unwrap().is_some());
    }
}
