//! Job types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Maximum dispatch attempts before a job is marked failed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base retry delay in seconds; doubles per attempt.
const RETRY_BASE_SECS: i64 = 5;

/// Idempotency key for a post's job. One live job per post is enforced by
/// keying the store on this.
pub fn job_key(post_id: &str) -> String {
    format!("post-{post_id}")
}

/// A delayed publish job for one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Store key, `"post-" + post_id`.
    pub key: String,
    pub post_id: String,
    pub owner_id: String,
    /// When this job should dispatch (or retry after a failure).
    pub due_at: DateTime<Utc>,
    /// Completed dispatch attempts.
    pub attempts_made: u32,
    pub max_attempts: u32,
    pub state: JobState,
    /// Set when the job enters the failed set, for retention cleanup.
    #[serde(default)]
    pub failed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Store-level state of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for its due time (or for a free worker once due).
    #[default]
    Delayed,
    /// Claimed by a worker, dispatch in flight.
    Active,
    /// Retry budget exhausted; kept until the failed-set retention sweep.
    Failed,
}

/// Queue state as reported to callers, distinguishing due-but-unclaimed
/// from still-delayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueState {
    Waiting,
    Delayed,
    Active,
    Failed,
}

/// Snapshot of a job's queue position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusInfo {
    pub key: String,
    pub state: QueueState,
    pub due_at: DateTime<Utc>,
    pub attempts_made: u32,
}

impl Job {
    pub fn new(post_id: impl Into<String>, owner_id: impl Into<String>, due_at: DateTime<Utc>) -> Self {
        let post_id = post_id.into();
        Self {
            key: job_key(&post_id),
            post_id,
            owner_id: owner_id.into(),
            due_at,
            attempts_made: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            state: JobState::Delayed,
            failed_at: None,
            created_at: Utc::now(),
        }
    }

    /// A job is due when it is waiting and its due time has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == JobState::Delayed && self.due_at <= now
    }

    /// A job counts as live while it can still dispatch.
    pub fn is_live(&self) -> bool {
        matches!(self.state, JobState::Delayed | JobState::Active)
    }

    /// Exponential backoff: 5s, 10s, 20s, ... for attempts 1, 2, 3, ...
    pub fn retry_delay(&self) -> Duration {
        let exponent = self.attempts_made.saturating_sub(1).min(10);
        Duration::seconds(RETRY_BASE_SECS << exponent)
    }

    pub fn queue_state(&self, now: DateTime<Utc>) -> QueueState {
        match self.state {
            JobState::Active => QueueState::Active,
            JobState::Failed => QueueState::Failed,
            JobState::Delayed if self.due_at <= now => QueueState::Waiting,
            JobState::Delayed => QueueState::Delayed,
        }
    }

    pub fn status_info(&self, now: DateTime<Utc>) -> JobStatusInfo {
        JobStatusInfo {
            key: self.key.clone(),
            state: self.queue_state(now),
            due_at: self.due_at,
            attempts_made: self.attempts_made,
        }
    }
}
