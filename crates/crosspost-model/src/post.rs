//! Posts and their status machine.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Platform, PostResults};

/// Kind of media attached to a post. Consistent across all refs of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// Lifecycle status of a post.
///
/// `draft → scheduled → publishing → {published, failed}`, with
/// `scheduled → draft` on cancel and `scheduled → scheduled` on reschedule.
/// `published` is terminal. A non-final dispatch attempt returns a post from
/// `publishing` to `scheduled` while the job waits out its retry backoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Scheduled,
    Publishing,
    Published,
    Failed,
}

impl PostStatus {
    /// Whether the status machine permits moving to `next`.
    pub fn can_transition_to(self, next: PostStatus) -> bool {
        use PostStatus::*;
        matches!(
            (self, next),
            (Draft, Scheduled)
                | (Draft, Publishing)
                | (Scheduled, Draft)
                | (Scheduled, Scheduled)
                | (Scheduled, Publishing)
                | (Scheduled, Failed)
                | (Publishing, Published)
                | (Publishing, Failed)
                | (Publishing, Scheduled)
                | (Failed, Publishing)
        )
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, PostStatus::Published)
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Publishing => "publishing",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The unit of schedulable work: one piece of content fanned out to one or
/// more platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub owner_id: String,
    pub content: String,
    /// Target platforms. Never empty for a persisted post.
    pub platforms: BTreeSet<Platform>,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub status: PostStatus,
    #[serde(default)]
    pub results: Option<PostResults>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post. Status starts at `scheduled` when a schedule time
    /// is given, `draft` otherwise.
    pub fn new(
        id: String,
        owner_id: String,
        content: String,
        platforms: BTreeSet<Platform>,
        media_urls: Vec<String>,
        media_type: Option<MediaType>,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> Self {
        let status = if scheduled_at.is_some() {
            PostStatus::Scheduled
        } else {
            PostStatus::Draft
        };

        Self {
            id,
            owner_id,
            content,
            platforms,
            media_urls,
            media_type,
            scheduled_at,
            published_at: None,
            status,
            results: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_with_schedule(scheduled_at: Option<DateTime<Utc>>) -> Post {
        Post::new(
            "p1".to_string(),
            "u1".to_string(),
            "hello".to_string(),
            BTreeSet::from([Platform::Twitter]),
            vec![],
            None,
            scheduled_at,
        )
    }

    #[test]
    fn test_new_post_status_follows_schedule() {
        assert_eq!(post_with_schedule(None).status, PostStatus::Draft);
        assert_eq!(
            post_with_schedule(Some(Utc::now())).status,
            PostStatus::Scheduled
        );
    }

    #[test]
    fn test_published_is_terminal() {
        for next in [
            PostStatus::Draft,
            PostStatus::Scheduled,
            PostStatus::Publishing,
            PostStatus::Failed,
        ] {
            assert!(!PostStatus::Published.can_transition_to(next));
        }
        assert!(PostStatus::Published.is_terminal());
    }

    #[test]
    fn test_reschedule_is_a_self_transition() {
        assert!(PostStatus::Scheduled.can_transition_to(PostStatus::Scheduled));
        assert!(!PostStatus::Draft.can_transition_to(PostStatus::Draft));
    }

    #[test]
    fn test_failed_posts_can_republish() {
        assert!(PostStatus::Failed.can_transition_to(PostStatus::Publishing));
        assert!(!PostStatus::Failed.can_transition_to(PostStatus::Published));
    }

    #[test]
    fn test_retry_returns_publishing_to_scheduled() {
        assert!(PostStatus::Publishing.can_transition_to(PostStatus::Scheduled));
    }
}
