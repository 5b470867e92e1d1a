//! The scheduler service: scheduling operations, the dispatch path, and the
//! worker loop.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crosspost_model::{Post, PostStatus, PublishOutcome, PublishReport};
use crosspost_store::PostStore;

use crate::{Job, JobState, JobStatusInfo, JobStore, SchedulerError, job_key};

/// Negative delays within this window are clamped to immediate dispatch,
/// absorbing clock skew between caller and scheduler.
const PAST_GRACE_SECS: i64 = 5 * 60;

/// Furthest ahead a post may be scheduled.
const MAX_HORIZON_DAYS: i64 = 365;

/// Minimum sleep duration between worker-loop checks.
const MIN_SLEEP_SECS: u64 = 1;

/// Maximum sleep duration between worker-loop checks.
const MAX_SLEEP_SECS: u64 = 60;

/// The capability the scheduler needs from the publish layer: fan one post
/// out and report how it went.
#[async_trait]
pub trait PostPublisher: Send + Sync {
    async fn publish(&self, post: &Post) -> PublishReport;
}

/// Owns the job store and drives scheduled posts through publication.
///
/// The Post table is the source of truth; the job store is a derived
/// accelerator rebuilt via [`restore_scheduled_posts`] after a restart.
///
/// [`restore_scheduled_posts`]: SchedulerService::restore_scheduled_posts
pub struct SchedulerService {
    jobs: Arc<dyn JobStore>,
    posts: Arc<dyn PostStore>,
    publisher: Arc<dyn PostPublisher>,
}

impl SchedulerService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        posts: Arc<dyn PostStore>,
        publisher: Arc<dyn PostPublisher>,
    ) -> Self {
        Self {
            jobs,
            posts,
            publisher,
        }
    }

    /// Enqueue a publish job for `scheduled_at`. The job key is derived
    /// from the post id, so a second schedule for the same post is rejected
    /// until the first is cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn schedule_post(
        &self,
        post_id: &str,
        owner_id: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Job, SchedulerError> {
        let now = Utc::now();
        let delay = validate_delay(scheduled_at, now)?;
        let job = Job::new(post_id, owner_id, now + delay);

        self.jobs.insert(job.clone()).await?;
        info!(
            post_id,
            due_at = %job.due_at,
            delay_ms = delay.num_milliseconds(),
            "scheduled post"
        );
        Ok(job)
    }

    /// Remove the pending job for a post. Idempotent: cancelling a schedule
    /// that does not exist returns `false`, not an error. A dispatch already
    /// in flight is not preempted; its status recheck resolves the race.
    pub async fn cancel_schedule(&self, post_id: &str) -> Result<bool, SchedulerError> {
        let existed = self.jobs.remove(&job_key(post_id)).await?;
        if existed {
            info!(post_id, "cancelled scheduled post");
        }
        Ok(existed)
    }

    /// Move a post's job to a new time: an atomic remove-then-add under the
    /// job key, leaving no window with two live jobs for one post.
    #[tracing::instrument(skip(self))]
    pub async fn reschedule_post(
        &self,
        post_id: &str,
        owner_id: &str,
        new_scheduled_at: DateTime<Utc>,
    ) -> Result<Job, SchedulerError> {
        let now = Utc::now();
        let delay = validate_delay(new_scheduled_at, now)?;
        let job = Job::new(post_id, owner_id, now + delay);

        self.jobs.replace(job.clone()).await?;
        info!(post_id, due_at = %job.due_at, "rescheduled post");
        Ok(job)
    }

    /// Queue position of a post's job, or `None` when no job exists.
    pub async fn get_job_status(
        &self,
        post_id: &str,
    ) -> Result<Option<JobStatusInfo>, SchedulerError> {
        let job = self.jobs.get(&job_key(post_id)).await?;
        Ok(job.map(|j| j.status_info(Utc::now())))
    }

    /// All waiting jobs, soonest first.
    pub async fn pending_jobs(&self) -> Result<Vec<Job>, SchedulerError> {
        self.jobs.pending().await
    }

    /// Crash recovery: re-create jobs for future-dated `scheduled` posts
    /// that have none. Run once at startup, after dependencies are wired.
    /// Expired schedules are left to the reconciliation sweep.
    #[tracing::instrument(skip(self))]
    pub async fn restore_scheduled_posts(&self) -> Result<usize, SchedulerError> {
        let now = Utc::now();
        let mut restored = 0;

        for post in self.posts.list_scheduled().await? {
            let Some(scheduled_at) = post.scheduled_at else {
                continue;
            };
            if scheduled_at <= now {
                continue;
            }
            if self.jobs.get(&job_key(&post.id)).await?.is_some() {
                continue;
            }

            match self
                .schedule_post(&post.id, &post.owner_id, scheduled_at)
                .await
            {
                Ok(_) => {
                    restored += 1;
                    info!(post_id = %post.id, "restored scheduled post");
                }
                Err(e) => {
                    warn!(post_id = %post.id, error = %e, "failed to restore scheduled post");
                }
            }
        }

        info!(restored, "restore pass complete");
        Ok(restored)
    }

    /// Publish a post right now, outside the queue: one attempt, no retry
    /// budget. Used by the immediate-publish surface.
    pub async fn publish_now(&self, owner_id: &str, post_id: &str) -> Result<Post, SchedulerError> {
        let post = self
            .posts
            .get_for_owner(owner_id, post_id)
            .await?
            .ok_or_else(|| {
                SchedulerError::Store(crosspost_store::StoreError::PostNotFound(
                    post_id.to_string(),
                ))
            })?;

        self.posts
            .set_status(&post.id, PostStatus::Publishing)
            .await?;

        // Any lingering job is now stale.
        self.jobs.remove(&job_key(post_id)).await?;

        let report = self.publisher.publish(&post).await;
        let now = Utc::now();
        let (status, published_at) = match report.outcome() {
            PublishOutcome::Success => (PostStatus::Published, Some(now)),
            PublishOutcome::Retryable | PublishOutcome::Terminal => (PostStatus::Failed, None),
        };

        self.posts
            .record_outcome(&post.id, status, report.into_results(), published_at)
            .await?;

        Ok(self.posts.get(&post.id).await?.ok_or_else(|| {
            SchedulerError::Store(crosspost_store::StoreError::PostNotFound(
                post_id.to_string(),
            ))
        })?)
    }

    /// Dispatch one claimed job.
    ///
    /// Stale jobs (post deleted, or no longer `scheduled`, e.g. a cancel
    /// racing a dispatch) are dropped without error. A retryable failure
    /// re-queues the job with exponential backoff and returns the post to
    /// `scheduled`; only the final failed attempt persists `failed` state.
    #[tracing::instrument(skip(self, job), fields(post_id = %job.post_id, attempt = job.attempts_made + 1))]
    pub async fn dispatch_job(&self, mut job: Job) {
        let post = match self
            .posts
            .get_for_owner(&job.owner_id, &job.post_id)
            .await
        {
            Ok(Some(post)) => post,
            Ok(None) => {
                warn!("post not found, dropping job");
                self.drop_job(&job.key).await;
                return;
            }
            Err(e) => {
                error!(error = %e, "failed to load post, re-queueing job");
                self.requeue_or_fail(job, "failed to load post").await;
                return;
            }
        };

        if post.status != PostStatus::Scheduled {
            info!(status = %post.status, "post no longer scheduled, dropping stale job");
            self.drop_job(&job.key).await;
            return;
        }

        if let Err(e) = self.posts.set_status(&post.id, PostStatus::Publishing).await {
            error!(error = %e, "failed to mark post publishing, dropping job");
            self.drop_job(&job.key).await;
            return;
        }

        let report = self.publisher.publish(&post).await;
        let now = Utc::now();

        match report.outcome() {
            PublishOutcome::Success => {
                info!("published scheduled post");
                self.persist_outcome(&post.id, PostStatus::Published, report, Some(now))
                    .await;
                self.drop_job(&job.key).await;
            }
            PublishOutcome::Terminal => {
                warn!("publish failed terminally");
                self.persist_outcome(&post.id, PostStatus::Failed, report, None)
                    .await;
                self.fail_job(job, now).await;
            }
            PublishOutcome::Retryable => {
                job.attempts_made += 1;
                if job.attempts_made >= job.max_attempts {
                    error!(
                        attempts = job.attempts_made,
                        "retry budget exhausted, marking post failed"
                    );
                    self.persist_outcome(&post.id, PostStatus::Failed, report, None)
                        .await;
                    self.fail_job(job, now).await;
                } else {
                    // Non-final failure: the post stays observable as
                    // scheduled while the job waits out its backoff.
                    let delay = job.retry_delay();
                    job.due_at = now + delay;
                    job.state = JobState::Delayed;
                    warn!(
                        attempts = job.attempts_made,
                        retry_in_secs = delay.num_seconds(),
                        "publish failed, retry scheduled"
                    );
                    if let Err(e) = self
                        .posts
                        .set_status(&post.id, PostStatus::Scheduled)
                        .await
                    {
                        error!(error = %e, "failed to return post to scheduled");
                    }
                    if let Err(e) = self.jobs.update(job).await {
                        error!(error = %e, "failed to re-queue job");
                    }
                }
            }
        }
    }

    /// Run the worker loop: claim due jobs, dispatch them, sleep until the
    /// next due time. Returns when the shutdown channel flips.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("scheduler worker starting");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let due = match self.jobs.claim_due(Utc::now()).await {
                Ok(due) => due,
                Err(e) => {
                    error!(error = %e, "failed to claim due jobs");
                    Vec::new()
                }
            };

            for job in due {
                if *shutdown_rx.borrow() {
                    info!("shutdown requested, not dispatching further jobs");
                    break;
                }
                self.dispatch_job(job).await;
            }

            let sleep_duration = self.sleep_duration().await;

            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("scheduler received shutdown signal");
                    }
                }
                _ = sleep(sleep_duration) => {}
            }
        }

        info!("scheduler worker shut down gracefully");
    }

    /// How long to sleep until the next job is due, bounded to
    /// [MIN_SLEEP_SECS, MAX_SLEEP_SECS].
    async fn sleep_duration(&self) -> std::time::Duration {
        let next_due = match self.jobs.next_due_at().await {
            Ok(next) => next,
            Err(e) => {
                error!(error = %e, "failed to read next due time");
                None
            }
        };

        let secs = match next_due {
            Some(next) => {
                let diff = (next - Utc::now()).num_seconds();
                (diff.max(MIN_SLEEP_SECS as i64) as u64).min(MAX_SLEEP_SECS)
            }
            None => MAX_SLEEP_SECS,
        };

        std::time::Duration::from_secs(secs)
    }

    async fn persist_outcome(
        &self,
        post_id: &str,
        status: PostStatus,
        report: PublishReport,
        published_at: Option<DateTime<Utc>>,
    ) {
        if let Err(e) = self
            .posts
            .record_outcome(post_id, status, report.into_results(), published_at)
            .await
        {
            error!(post_id, error = %e, "failed to persist publish outcome");
        }
    }

    async fn drop_job(&self, key: &str) {
        if let Err(e) = self.jobs.remove(key).await {
            error!(key, error = %e, "failed to remove job");
        }
    }

    /// Move a job into the failed set, keeping it for the retention sweep.
    async fn fail_job(&self, mut job: Job, now: DateTime<Utc>) {
        job.state = JobState::Failed;
        job.failed_at = Some(now);
        if let Err(e) = self.jobs.update(job).await {
            error!(error = %e, "failed to mark job failed");
        }
    }

    /// Store hiccup while loading the post: treat like a retryable publish
    /// failure so the attempt budget still bounds the job.
    async fn requeue_or_fail(&self, mut job: Job, reason: &str) {
        let now = Utc::now();
        job.attempts_made += 1;
        if job.attempts_made >= job.max_attempts {
            warn!(reason, "attempt budget exhausted for unloadable post");
            self.fail_job(job, now).await;
        } else {
            job.due_at = now + job.retry_delay();
            job.state = JobState::Delayed;
            if let Err(e) = self.jobs.update(job).await {
                error!(error = %e, "failed to re-queue job");
            }
        }
    }
}

/// Validate a schedule time against the grace window and horizon, returning
/// the (non-negative) delay from `now`.
fn validate_delay(
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Duration, SchedulerError> {
    let delay = scheduled_at - now;

    if delay < -Duration::seconds(PAST_GRACE_SECS) {
        return Err(SchedulerError::InPast(scheduled_at));
    }
    if delay > Duration::days(MAX_HORIZON_DAYS) {
        return Err(SchedulerError::TooFarAhead(scheduled_at));
    }

    Ok(delay.max(Duration::zero()))
}
