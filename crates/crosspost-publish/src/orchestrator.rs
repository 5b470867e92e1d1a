//! Fan-out of one post to every platform it targets.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crosspost_model::{MediaType, Platform, Post, PublishReport};
use crosspost_splitter::split;
use crosspost_store::{ConnectionStore, PublishLogEntry, PublishLogStore};

use crate::chain::publish_chain;
use crate::{MediaRef, PublishError, PublisherRegistry, RemotePost};

/// Publishes one post to each of its platforms independently, collecting a
/// partial-failure-tolerant aggregate report.
///
/// One platform's failure never aborts its siblings; every outcome, success
/// or error, lands in the report and in the publish log.
pub struct PublishOrchestrator {
    connections: Arc<dyn ConnectionStore>,
    publish_log: Arc<dyn PublishLogStore>,
    registry: PublisherRegistry,
}

impl PublishOrchestrator {
    pub fn new(
        connections: Arc<dyn ConnectionStore>,
        publish_log: Arc<dyn PublishLogStore>,
        registry: PublisherRegistry,
    ) -> Self {
        Self {
            connections,
            publish_log,
            registry,
        }
    }

    /// Publish a post to all of its platforms.
    #[tracing::instrument(skip(self, post), fields(post_id = %post.id))]
    pub async fn publish_post(&self, post: &Post) -> PublishReport {
        self.publish(
            &post.owner_id,
            &post.id,
            &post.content,
            &post.platforms,
            &post.media_urls,
            post.media_type,
        )
        .await
    }

    /// Fan `content` out to `platforms`, one platform at a time.
    pub async fn publish(
        &self,
        owner_id: &str,
        post_id: &str,
        content: &str,
        platforms: &BTreeSet<Platform>,
        media_urls: &[String],
        media_type: Option<MediaType>,
    ) -> PublishReport {
        let mut report = PublishReport::new();

        for &platform in platforms {
            let outcome = self
                .publish_to(owner_id, content, platform, media_urls, media_type)
                .await;

            let log_entry = match &outcome {
                Ok(remote) => {
                    info!(platform = %platform, remote_id = %remote.remote_id, "published");
                    report.record_success(platform, remote.remote_id.clone(), remote.url.clone());
                    PublishLogEntry::new(owner_id, post_id, platform, true, None)
                }
                Err(e) => {
                    warn!(platform = %platform, error = %e, "publish failed");
                    report.record_failure(platform, e.to_string(), e.is_retryable());
                    PublishLogEntry::new(owner_id, post_id, platform, false, Some(e.to_string()))
                }
            };

            if let Err(e) = self.publish_log.append(log_entry).await {
                warn!(platform = %platform, error = %e, "failed to append publish log");
            }
        }

        report
    }

    /// Publish to a single platform: resolve the publisher and credential,
    /// split when the content exceeds the platform limit, and chain the
    /// resulting chunks.
    async fn publish_to(
        &self,
        owner_id: &str,
        content: &str,
        platform: Platform,
        media_urls: &[String],
        media_type: Option<MediaType>,
    ) -> Result<RemotePost, PublishError> {
        let publisher = self
            .registry
            .get(platform)
            .ok_or(PublishError::NoPublisher(platform))?;

        let media = media_urls.first().map(|url| MediaRef {
            url: url.clone(),
            media_type: media_type.unwrap_or(MediaType::Image),
        });

        if platform.requires_media() && media.is_none() {
            return Err(PublishError::MediaRequired(platform));
        }

        let credential = self
            .connections
            .decrypted_credential(owner_id, platform)
            .await?
            .ok_or(PublishError::NotConnected(platform))?;

        let result = split(content, platform);
        if !result.needs_splitting {
            publisher
                .publish_single(&credential, content, media.as_ref())
                .await
        } else {
            publish_chain(
                publisher.as_ref(),
                &credential,
                &result.chunks,
                media.as_ref(),
            )
            .await
        }
    }
}
