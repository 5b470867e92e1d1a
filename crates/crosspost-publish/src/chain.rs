//! Chain publish: sequential publication of chunks where each references
//! the previous one as its parent.

use std::time::Duration;

use tracing::debug;

use crosspost_store::Credential;

use crate::{MediaRef, PlatformPublisher, PublishError, RemotePost};

/// Pause between successive chunk publishes, to stay friendly with platform
/// rate limits.
const INTER_CHUNK_DELAY: Duration = Duration::from_secs(1);

/// Publish `chunks` as a causally-linked sequence.
///
/// Chunk 1 goes out standalone (carrying the media, if any); each later
/// chunk continues from the previous chunk's remote id. The first failure
/// stops the chain: remaining chunks are never sent and the error becomes
/// the platform's result. On success the *first* chunk's identity is
/// returned; intermediate ids are transient chaining state.
pub async fn publish_chain(
    publisher: &dyn PlatformPublisher,
    credential: &Credential,
    chunks: &[String],
    media: Option<&MediaRef>,
) -> Result<RemotePost, PublishError> {
    let mut first: Option<RemotePost> = None;
    let mut parent: Option<String> = None;

    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(INTER_CHUNK_DELAY).await;
        }

        let remote = match &parent {
            None => publisher.publish_single(credential, chunk, media).await?,
            Some(parent_id) => {
                publisher
                    .publish_chained(credential, chunk, parent_id)
                    .await?
            }
        };

        debug!(
            platform = %publisher.platform(),
            chunk = i + 1,
            total = chunks.len(),
            remote_id = %remote.remote_id,
            "published chunk"
        );

        parent = Some(remote.remote_id.clone());
        if first.is_none() {
            first = Some(remote);
        }
    }

    first.ok_or_else(|| PublishError::InvalidResponse {
        platform: publisher.platform(),
        message: "empty chunk sequence".to_string(),
    })
}
