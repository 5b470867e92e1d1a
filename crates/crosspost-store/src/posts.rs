//! The Post persistence port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crosspost_model::{Post, PostResults, PostStatus};

use crate::StoreError;

/// CRUD and status-transition persistence for posts.
///
/// Implementations enforce the status machine on every transition and treat
/// `published` posts as immutable.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: Post) -> Result<(), StoreError>;

    async fn get(&self, post_id: &str) -> Result<Option<Post>, StoreError>;

    /// Owner-scoped lookup; a post belonging to a different owner reads as
    /// absent.
    async fn get_for_owner(
        &self,
        owner_id: &str,
        post_id: &str,
    ) -> Result<Option<Post>, StoreError>;

    async fn list_for_owner(
        &self,
        owner_id: &str,
        status: Option<PostStatus>,
    ) -> Result<Vec<Post>, StoreError>;

    /// All posts currently in `scheduled` status.
    async fn list_scheduled(&self) -> Result<Vec<Post>, StoreError>;

    /// Scheduled posts whose schedule time is older than `cutoff`.
    async fn list_scheduled_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Post>, StoreError>;

    /// Move a post to `status`, enforcing the status machine.
    async fn set_status(&self, post_id: &str, status: PostStatus) -> Result<(), StoreError>;

    /// Update (or clear) a post's schedule time.
    async fn set_schedule(
        &self,
        post_id: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Persist a dispatch outcome: final status, results map, and the
    /// publish timestamp when publication succeeded.
    async fn record_outcome(
        &self,
        post_id: &str,
        status: PostStatus,
        results: PostResults,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Delete an owner's post. Refuses for `published` posts. Returns
    /// whether a post was deleted.
    async fn delete(&self, owner_id: &str, post_id: &str) -> Result<bool, StoreError>;

    /// Storage hygiene: drop `published` posts older than `cutoff`.
    /// Returns how many were deleted.
    async fn delete_published_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}
