//! Periodic reconciliation between the Post table and the job queue, plus
//! retention housekeeping.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crosspost_model::{PostResults, PostStatus};
use crosspost_store::{PostStore, PublishLogStore};

use crate::{JobStore, SchedulerError, job_key};

/// Failed-job cleanup proceeds in batches of this size until drained.
const FAILED_CLEAN_BATCH: usize = 100;

/// Error recorded on posts whose schedule expired without dispatch.
const EXPIRED_ERROR: &str = "Scheduled time passed without publishing";

/// Retention and grace windows for the sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How far past its schedule a post may run before it is force-failed.
    /// Chosen to exceed the retry/backoff horizon so in-flight retries are
    /// never falsely expired.
    pub expiry_grace: Duration,
    /// How long failed jobs stay in the queue's failed set.
    pub failed_job_retention: Duration,
    /// How long published posts are kept.
    pub published_post_retention: Duration,
    /// How long publish-log rows are kept.
    pub publish_log_retention: Duration,
    /// Gap between retention passes; the expiry check runs every tick.
    pub retention_interval: std::time::Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            expiry_grace: Duration::minutes(30),
            failed_job_retention: Duration::hours(24),
            published_post_retention: Duration::days(90),
            publish_log_retention: Duration::days(30),
            retention_interval: std::time::Duration::from_secs(60 * 60),
        }
    }
}

/// Out-of-band safety net. Every check is idempotent and safe to run
/// concurrently with live scheduling.
pub struct ReconciliationSweep {
    posts: Arc<dyn PostStore>,
    jobs: Arc<dyn JobStore>,
    publish_log: Arc<dyn PublishLogStore>,
    config: SweepConfig,
}

impl ReconciliationSweep {
    pub fn new(
        posts: Arc<dyn PostStore>,
        jobs: Arc<dyn JobStore>,
        publish_log: Arc<dyn PublishLogStore>,
        config: SweepConfig,
    ) -> Self {
        Self {
            posts,
            jobs,
            publish_log,
            config,
        }
    }

    /// Guard against silent job loss: scheduled posts whose time passed the
    /// grace buffer without dispatch are force-marked failed, and any
    /// lingering job for them is dropped.
    #[tracing::instrument(skip(self))]
    pub async fn check_expired_schedules(&self) -> Result<usize, SchedulerError> {
        let cutoff = Utc::now() - self.config.expiry_grace;
        let expired = self.posts.list_scheduled_before(cutoff).await?;

        if expired.is_empty() {
            return Ok(0);
        }

        warn!(count = expired.len(), "found expired scheduled posts");
        let mut failed = 0;
        for post in &expired {
            match self
                .posts
                .record_outcome(
                    &post.id,
                    PostStatus::Failed,
                    PostResults::aborted(EXPIRED_ERROR),
                    None,
                )
                .await
            {
                Ok(()) => {
                    failed += 1;
                    warn!(post_id = %post.id, scheduled_at = ?post.scheduled_at, "expired scheduled post marked failed");
                }
                Err(e) => {
                    error!(post_id = %post.id, error = %e, "failed to expire scheduled post");
                    continue;
                }
            }

            if let Err(e) = self.jobs.remove(&job_key(&post.id)).await {
                error!(post_id = %post.id, error = %e, "failed to drop job for expired post");
            }
        }

        Ok(failed)
    }

    /// Drain failed jobs older than the retention window, in bounded
    /// batches so one pass can't monopolize the store.
    #[tracing::instrument(skip(self))]
    pub async fn clean_failed_jobs(&self) -> Result<usize, SchedulerError> {
        let cutoff = Utc::now() - self.config.failed_job_retention;
        let mut total = 0;

        loop {
            let removed = self.jobs.clean_failed(cutoff, FAILED_CLEAN_BATCH).await?;
            total += removed;
            if removed < FAILED_CLEAN_BATCH {
                break;
            }
        }

        if total > 0 {
            info!(cleaned = total, "cleaned stale failed jobs");
        }
        Ok(total)
    }

    /// Storage hygiene: old published posts and old publish-log rows.
    #[tracing::instrument(skip(self))]
    pub async fn clean_history(&self) -> Result<(usize, usize), SchedulerError> {
        let now = Utc::now();

        let posts_deleted = self
            .posts
            .delete_published_before(now - self.config.published_post_retention)
            .await?;
        let logs_deleted = self
            .publish_log
            .delete_logged_before(now - self.config.publish_log_retention)
            .await?;

        if posts_deleted > 0 || logs_deleted > 0 {
            info!(posts_deleted, logs_deleted, "cleaned historical data");
        }
        Ok((posts_deleted, logs_deleted))
    }

    /// Run the sweep loop: the expiry check every `tick`, the retention
    /// checks every `retention_interval`. Returns when the shutdown channel
    /// flips.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>, tick: std::time::Duration) {
        info!("reconciliation sweep starting");
        let mut last_retention = tokio::time::Instant::now();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            if let Err(e) = self.check_expired_schedules().await {
                error!(error = %e, "expired-schedule check failed");
            }

            if last_retention.elapsed() >= self.config.retention_interval {
                last_retention = tokio::time::Instant::now();
                if let Err(e) = self.clean_failed_jobs().await {
                    error!(error = %e, "failed-job cleanup failed");
                }
                if let Err(e) = self.clean_history().await {
                    error!(error = %e, "history cleanup failed");
                }
            }

            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("sweep received shutdown signal");
                    }
                }
                _ = sleep(tick) => {}
            }
        }

        info!("reconciliation sweep shut down gracefully");
    }
}
