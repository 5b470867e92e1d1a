//! The per-platform publisher capability.

use async_trait::async_trait;

use crosspost_model::{MediaType, Platform};
use crosspost_store::Credential;

use crate::PublishError;

/// Identity of a post created on a remote platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePost {
    pub remote_id: String,
    pub url: Option<String>,
}

/// A media attachment presented to a publisher. Only the first chunk of a
/// chain carries media.
#[derive(Debug, Clone)]
pub struct MediaRef {
    pub url: String,
    pub media_type: MediaType,
}

/// Capability for publishing to one platform.
///
/// Implementations are registered in a [`PublisherRegistry`] keyed by
/// [`Platform`]; adding a platform means registering a new implementation,
/// not editing dispatch sites.
///
/// [`PublisherRegistry`]: crate::PublisherRegistry
#[async_trait]
pub trait PlatformPublisher: Send + Sync {
    /// The platform this publisher serves.
    fn platform(&self) -> Platform;

    /// Publish a standalone post.
    async fn publish_single(
        &self,
        credential: &Credential,
        text: &str,
        media: Option<&MediaRef>,
    ) -> Result<RemotePost, PublishError>;

    /// Publish a continuation of `parent_remote_id` (a reply, a threaded
    /// post, or a comment, whatever the platform's chaining construct is).
    async fn publish_chained(
        &self,
        credential: &Credential,
        text: &str,
        parent_remote_id: &str,
    ) -> Result<RemotePost, PublishError>;
}
