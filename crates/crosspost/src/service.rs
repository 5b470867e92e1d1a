//! The post service: the surface a transport layer consumes.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crosspost_model::{MediaType, Platform, Post, PostStatus};
use crosspost_scheduler::{Job, JobStatusInfo, SchedulerError, SchedulerService};
use crosspost_splitter::{SplitResult, split_for_platforms};
use crosspost_store::{PostStore, StoreError};

/// Errors surfaced to the transport layer.
#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error("content must not be empty")]
    EmptyContent,

    #[error("platform set must not be empty")]
    NoPlatforms,

    #[error("post not found: {0}")]
    PostNotFound(String),

    #[error("post already published: {0}")]
    AlreadyPublished(String),

    #[error("post is not scheduled: {0}")]
    NotScheduled(String),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input for creating a post.
#[derive(Debug, Clone)]
pub struct CreatePostRequest {
    pub content: String,
    pub platforms: BTreeSet<Platform>,
    pub media_urls: Vec<String>,
    pub media_type: Option<MediaType>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Post CRUD plus the scheduling operations, delegating queue work to the
/// scheduler. The scheduler is injected, never reached through a
/// back-reference from the post layer.
pub struct PostService {
    posts: Arc<dyn PostStore>,
    scheduler: Arc<SchedulerService>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>, scheduler: Arc<SchedulerService>) -> Self {
        Self { posts, scheduler }
    }

    /// Create a post; when a schedule time is given the post starts out
    /// `scheduled` with a live job. Validation failures never enqueue.
    pub async fn create_post(
        &self,
        owner_id: &str,
        request: CreatePostRequest,
    ) -> Result<Post, PostServiceError> {
        if request.content.trim().is_empty() {
            return Err(PostServiceError::EmptyContent);
        }
        if request.platforms.is_empty() {
            return Err(PostServiceError::NoPlatforms);
        }

        let post = Post::new(
            Uuid::new_v4().to_string(),
            owner_id.to_string(),
            request.content,
            request.platforms,
            request.media_urls,
            request.media_type,
            request.scheduled_at,
        );
        self.posts.insert(post.clone()).await?;

        if let Some(scheduled_at) = post.scheduled_at {
            if let Err(e) = self
                .scheduler
                .schedule_post(&post.id, owner_id, scheduled_at)
                .await
            {
                // Roll the post back so no scheduled post exists jobless.
                let _ = self.posts.delete(owner_id, &post.id).await;
                return Err(e.into());
            }
        }

        info!(post_id = %post.id, status = %post.status, "created post");
        Ok(post)
    }

    /// Publish immediately, outside the queue: one attempt, final result.
    pub async fn publish_post(
        &self,
        owner_id: &str,
        post_id: &str,
    ) -> Result<Post, PostServiceError> {
        let post = self.require_post(owner_id, post_id).await?;
        if post.status == PostStatus::Published {
            return Err(PostServiceError::AlreadyPublished(post_id.to_string()));
        }

        Ok(self.scheduler.publish_now(owner_id, post_id).await?)
    }

    /// Move a scheduled post to a new time.
    pub async fn update_schedule(
        &self,
        owner_id: &str,
        post_id: &str,
        new_scheduled_at: DateTime<Utc>,
    ) -> Result<Job, PostServiceError> {
        let post = self.require_post(owner_id, post_id).await?;
        if post.status != PostStatus::Scheduled {
            return Err(PostServiceError::NotScheduled(post_id.to_string()));
        }

        let job = self
            .scheduler
            .reschedule_post(post_id, owner_id, new_scheduled_at)
            .await?;
        self.posts
            .set_schedule(post_id, Some(new_scheduled_at))
            .await?;

        Ok(job)
    }

    /// Cancel a schedule: drop the job and return the post to draft.
    /// Idempotent; returns whether a job existed.
    pub async fn cancel_schedule(
        &self,
        owner_id: &str,
        post_id: &str,
    ) -> Result<bool, PostServiceError> {
        let post = self.require_post(owner_id, post_id).await?;

        let existed = self.scheduler.cancel_schedule(post_id).await?;
        if post.status == PostStatus::Scheduled {
            self.posts.set_status(post_id, PostStatus::Draft).await?;
            self.posts.set_schedule(post_id, None).await?;
        }

        Ok(existed)
    }

    /// Queue position of the post's job, if any.
    pub async fn get_schedule_status(
        &self,
        owner_id: &str,
        post_id: &str,
    ) -> Result<Option<JobStatusInfo>, PostServiceError> {
        self.require_post(owner_id, post_id).await?;
        Ok(self.scheduler.get_job_status(post_id).await?)
    }

    /// How content would split per platform, without publishing anything.
    pub fn preview_split(&self, content: &str, platforms: &[Platform]) -> Vec<SplitResult> {
        split_for_platforms(content, platforms)
    }

    pub async fn get_post(
        &self,
        owner_id: &str,
        post_id: &str,
    ) -> Result<Option<Post>, PostServiceError> {
        Ok(self.posts.get_for_owner(owner_id, post_id).await?)
    }

    pub async fn list_posts(
        &self,
        owner_id: &str,
        status: Option<PostStatus>,
    ) -> Result<Vec<Post>, PostServiceError> {
        Ok(self.posts.list_for_owner(owner_id, status).await?)
    }

    /// Delete a post (and its schedule). Published posts are immutable.
    pub async fn delete_post(
        &self,
        owner_id: &str,
        post_id: &str,
    ) -> Result<bool, PostServiceError> {
        self.require_post(owner_id, post_id).await?;
        self.scheduler.cancel_schedule(post_id).await?;
        Ok(self.posts.delete(owner_id, post_id).await?)
    }

    async fn require_post(&self, owner_id: &str, post_id: &str) -> Result<Post, PostServiceError> {
        self.posts
            .get_for_owner(owner_id, post_id)
            .await?
            .ok_or_else(|| PostServiceError::PostNotFound(post_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::Duration;

    use crosspost_model::PublishReport;
    use crosspost_scheduler::{InMemoryJobStore, JobStore, PostPublisher};
    use crosspost_store::InMemoryPostStore;

    struct AlwaysOk;

    #[async_trait]
    impl PostPublisher for AlwaysOk {
        async fn publish(&self, _post: &Post) -> PublishReport {
            let mut report = PublishReport::new();
            report.record_success(Platform::Twitter, "remote-1", None);
            report
        }
    }

    struct Fixture {
        jobs: Arc<InMemoryJobStore>,
        posts: Arc<InMemoryPostStore>,
        service: PostService,
    }

    fn fixture() -> Fixture {
        let jobs = Arc::new(InMemoryJobStore::new());
        let posts = Arc::new(InMemoryPostStore::new());
        let scheduler = Arc::new(SchedulerService::new(
            Arc::clone(&jobs) as Arc<dyn JobStore>,
            Arc::clone(&posts) as Arc<dyn PostStore>,
            Arc::new(AlwaysOk),
        ));
        let service = PostService::new(Arc::clone(&posts) as Arc<dyn PostStore>, scheduler);
        Fixture {
            jobs,
            posts,
            service,
        }
    }

    fn request(scheduled_at: Option<DateTime<Utc>>) -> CreatePostRequest {
        CreatePostRequest {
            content: "hello world".to_string(),
            platforms: BTreeSet::from([Platform::Twitter]),
            media_urls: vec![],
            media_type: None,
            scheduled_at,
        }
    }

    #[tokio::test]
    async fn test_create_draft_without_schedule() {
        let f = fixture();
        let post = f.service.create_post("owner-1", request(None)).await.unwrap();

        assert_eq!(post.status, PostStatus::Draft);
        assert!(f.jobs.get(&format!("post-{}", post.id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_scheduled_post_enqueues_job() {
        let f = fixture();
        let at = Utc::now() + Duration::minutes(30);
        let post = f
            .service
            .create_post("owner-1", request(Some(at)))
            .await
            .unwrap();

        assert_eq!(post.status, PostStatus::Scheduled);
        let job = f
            .jobs
            .get(&format!("post-{}", post.id))
            .await
            .unwrap()
            .unwrap();
        assert!((job.due_at - at).num_seconds().abs() <= 1);
    }

    #[tokio::test]
    async fn test_invalid_schedule_never_persists_post() {
        let f = fixture();
        let err = f
            .service
            .create_post("owner-1", request(Some(Utc::now() - Duration::hours(1))))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PostServiceError::Scheduler(SchedulerError::InPast(_))
        ));
        assert!(f.service.list_posts("owner-1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_rejects_empty_input() {
        let f = fixture();

        let mut empty_content = request(None);
        empty_content.content = "   ".to_string();
        assert!(matches!(
            f.service.create_post("owner-1", empty_content).await,
            Err(PostServiceError::EmptyContent)
        ));

        let mut no_platforms = request(None);
        no_platforms.platforms.clear();
        assert!(matches!(
            f.service.create_post("owner-1", no_platforms).await,
            Err(PostServiceError::NoPlatforms)
        ));
    }

    #[tokio::test]
    async fn test_cancel_returns_post_to_draft() {
        let f = fixture();
        let at = Utc::now() + Duration::minutes(30);
        let post = f
            .service
            .create_post("owner-1", request(Some(at)))
            .await
            .unwrap();

        assert!(f.service.cancel_schedule("owner-1", &post.id).await.unwrap());

        let post = f.posts.get(&post.id).await.unwrap().unwrap();
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.scheduled_at.is_none());

        // Second cancel: no job, no error.
        assert!(!f.service.cancel_schedule("owner-1", &post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_schedule_requires_scheduled_status() {
        let f = fixture();
        let post = f.service.create_post("owner-1", request(None)).await.unwrap();

        let err = f
            .service
            .update_schedule("owner-1", &post.id, Utc::now() + Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PostServiceError::NotScheduled(_)));
    }

    #[tokio::test]
    async fn test_update_schedule_moves_job_and_post() {
        let f = fixture();
        let t1 = Utc::now() + Duration::minutes(30);
        let t2 = Utc::now() + Duration::hours(3);
        let post = f
            .service
            .create_post("owner-1", request(Some(t1)))
            .await
            .unwrap();

        let job = f
            .service
            .update_schedule("owner-1", &post.id, t2)
            .await
            .unwrap();

        assert!((job.due_at - t2).num_seconds().abs() <= 1);
        let stored = f.posts.get(&post.id).await.unwrap().unwrap();
        assert_eq!(stored.scheduled_at, Some(t2));
        assert_eq!(stored.status, PostStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_publish_post_immediate() {
        let f = fixture();
        let post = f.service.create_post("owner-1", request(None)).await.unwrap();

        let published = f.service.publish_post("owner-1", &post.id).await.unwrap();
        assert_eq!(published.status, PostStatus::Published);

        let err = f
            .service
            .publish_post("owner-1", &post.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PostServiceError::AlreadyPublished(_)));
    }

    #[tokio::test]
    async fn test_preview_split_covers_each_platform() {
        let f = fixture();
        let results =
            f.service
                .preview_split("short text", &[Platform::Twitter, Platform::Facebook]);

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.needs_splitting));
    }

    #[tokio::test]
    async fn test_delete_post_cancels_schedule() {
        let f = fixture();
        let at = Utc::now() + Duration::minutes(30);
        let post = f
            .service
            .create_post("owner-1", request(Some(at)))
            .await
            .unwrap();

        assert!(f.service.delete_post("owner-1", &post.id).await.unwrap());
        assert!(f.jobs.get(&format!("post-{}", post.id)).await.unwrap().is_none());
        assert!(f.service.get_post("owner-1", &post.id).await.unwrap().is_none());
    }
}
