//! In-memory store implementations.
//!
//! These back the daemon's default wiring and the test suites. A database
//! backend replaces them by implementing the same ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;

use crosspost_model::{Platform, Post, PostResults, PostStatus};

use crate::{
    ConnectionStore, Credential, PostStore, PublishLogEntry, PublishLogStore, StoreError,
};

/// Posts keyed by id.
#[derive(Default)]
pub struct InMemoryPostStore {
    posts: DashMap<String, Post>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, post: Post) -> Result<(), StoreError> {
        self.posts.insert(post.id.clone(), post);
        Ok(())
    }

    async fn get(&self, post_id: &str) -> Result<Option<Post>, StoreError> {
        Ok(self.posts.get(post_id).map(|p| p.clone()))
    }

    async fn get_for_owner(
        &self,
        owner_id: &str,
        post_id: &str,
    ) -> Result<Option<Post>, StoreError> {
        Ok(self
            .posts
            .get(post_id)
            .filter(|p| p.owner_id == owner_id)
            .map(|p| p.clone()))
    }

    async fn list_for_owner(
        &self,
        owner_id: &str,
        status: Option<PostStatus>,
    ) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| p.owner_id == owner_id && status.is_none_or(|s| p.status == s))
            .map(|p| p.clone())
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn list_scheduled(&self) -> Result<Vec<Post>, StoreError> {
        Ok(self
            .posts
            .iter()
            .filter(|p| p.status == PostStatus::Scheduled)
            .map(|p| p.clone())
            .collect())
    }

    async fn list_scheduled_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Post>, StoreError> {
        Ok(self
            .posts
            .iter()
            .filter(|p| {
                p.status == PostStatus::Scheduled
                    && p.scheduled_at.is_some_and(|at| at < cutoff)
            })
            .map(|p| p.clone())
            .collect())
    }

    async fn set_status(&self, post_id: &str, status: PostStatus) -> Result<(), StoreError> {
        let mut post = self
            .posts
            .get_mut(post_id)
            .ok_or_else(|| StoreError::PostNotFound(post_id.to_string()))?;

        if !post.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                post_id: post_id.to_string(),
                from: post.status,
                to: status,
            });
        }

        post.status = status;
        Ok(())
    }

    async fn set_schedule(
        &self,
        post_id: &str,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut post = self
            .posts
            .get_mut(post_id)
            .ok_or_else(|| StoreError::PostNotFound(post_id.to_string()))?;

        if post.status.is_terminal() {
            return Err(StoreError::PublishedImmutable(post_id.to_string()));
        }

        post.scheduled_at = scheduled_at;
        Ok(())
    }

    async fn record_outcome(
        &self,
        post_id: &str,
        status: PostStatus,
        results: PostResults,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut post = self
            .posts
            .get_mut(post_id)
            .ok_or_else(|| StoreError::PostNotFound(post_id.to_string()))?;

        if !post.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                post_id: post_id.to_string(),
                from: post.status,
                to: status,
            });
        }

        post.status = status;
        post.results = Some(results);
        if published_at.is_some() {
            post.published_at = published_at;
        }
        Ok(())
    }

    async fn delete(&self, owner_id: &str, post_id: &str) -> Result<bool, StoreError> {
        let Some(post) = self.posts.get(post_id) else {
            return Ok(false);
        };
        if post.owner_id != owner_id {
            return Ok(false);
        }
        if post.status == PostStatus::Published {
            return Err(StoreError::PublishedImmutable(post_id.to_string()));
        }
        drop(post);

        Ok(self.posts.remove(post_id).is_some())
    }

    async fn delete_published_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let before = self.posts.len();
        self.posts.retain(|_, p| {
            !(p.status == PostStatus::Published
                && p.published_at.is_some_and(|at| at < cutoff))
        });
        Ok(before - self.posts.len())
    }
}

/// Connections keyed by `(owner, platform)`.
#[derive(Default)]
pub struct InMemoryConnectionStore {
    connections: DashMap<(String, Platform), Credential>,
}

impl InMemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link an owner to a platform account.
    pub fn link(&self, owner_id: impl Into<String>, platform: Platform, credential: Credential) {
        self.connections
            .insert((owner_id.into(), platform), credential);
    }
}

#[async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    async fn decrypted_credential(
        &self,
        owner_id: &str,
        platform: Platform,
    ) -> Result<Option<Credential>, StoreError> {
        Ok(self
            .connections
            .get(&(owner_id.to_string(), platform))
            .map(|c| c.clone()))
    }
}

/// Append-only log kept in insertion order.
#[derive(Default)]
pub struct InMemoryPublishLogStore {
    entries: RwLock<Vec<PublishLogEntry>>,
}

impl InMemoryPublishLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<PublishLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl PublishLogStore for InMemoryPublishLogStore {
    async fn append(&self, entry: PublishLogEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn delete_logged_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.logged_at >= cutoff);
        Ok(before - entries.len())
    }
}
