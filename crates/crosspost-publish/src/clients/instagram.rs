//! Instagram Business publisher.
//!
//! Instagram cannot publish bare text; every post needs media. Publishing
//! is the container two-step (create, then publish), collapsed to
//! synchronous calls. Chained chunks continue as comments.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crosspost_model::{MediaType, Platform};
use crosspost_store::Credential;

use crate::clients::{graph_api_error, http_client};
use crate::{MediaRef, PlatformPublisher, PublishError, RemotePost};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v19.0";

pub struct InstagramPublisher {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

impl InstagramPublisher {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: http_client(),
            base_url: base_url.into(),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        access_token: &str,
        body: serde_json::Value,
    ) -> Result<String, PublishError> {
        let response = self
            .http
            .post(url)
            .query(&[("access_token", access_token)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(graph_api_error(Platform::Instagram, response).await);
        }

        let created: IdResponse = response.json().await?;
        Ok(created.id)
    }

    /// Step 1: create the media container for the image or video.
    async fn create_container(
        &self,
        credential: &Credential,
        caption: &str,
        media: &MediaRef,
    ) -> Result<String, PublishError> {
        let url = format!("{}/{}/media", self.base_url, credential.platform_user_id);

        let body = match media.media_type {
            MediaType::Image => json!({ "image_url": media.url, "caption": caption }),
            MediaType::Video => {
                json!({ "media_type": "VIDEO", "video_url": media.url, "caption": caption })
            }
        };

        self.post_json(&url, &credential.access_token, body).await
    }

    /// Step 2: publish the container.
    async fn publish_container(
        &self,
        credential: &Credential,
        container_id: &str,
    ) -> Result<RemotePost, PublishError> {
        let url = format!(
            "{}/{}/media_publish",
            self.base_url, credential.platform_user_id
        );

        let media_id = self
            .post_json(
                &url,
                &credential.access_token,
                json!({ "creation_id": container_id }),
            )
            .await?;

        let url = format!("https://www.instagram.com/p/{media_id}");
        Ok(RemotePost {
            remote_id: media_id,
            url: Some(url),
        })
    }
}

impl Default for InstagramPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformPublisher for InstagramPublisher {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn publish_single(
        &self,
        credential: &Credential,
        text: &str,
        media: Option<&MediaRef>,
    ) -> Result<RemotePost, PublishError> {
        let media = media.ok_or(PublishError::MediaRequired(Platform::Instagram))?;

        let container_id = self.create_container(credential, text, media).await?;
        self.publish_container(credential, &container_id).await
    }

    async fn publish_chained(
        &self,
        credential: &Credential,
        text: &str,
        parent_remote_id: &str,
    ) -> Result<RemotePost, PublishError> {
        let url = format!("{}/{}/comments", self.base_url, parent_remote_id);
        let comment_id = self
            .post_json(&url, &credential.access_token, json!({ "message": text }))
            .await?;

        Ok(RemotePost {
            remote_id: comment_id,
            url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credential() -> Credential {
        Credential {
            access_token: "ig-token".to_string(),
            platform_user_id: "iguser".to_string(),
        }
    }

    fn image() -> MediaRef {
        MediaRef {
            url: "https://cdn.example.com/pic.jpg".to_string(),
            media_type: MediaType::Image,
        }
    }

    #[tokio::test]
    async fn test_image_container_two_step() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/iguser/media"))
            .and(body_partial_json(serde_json::json!({
                "image_url": "https://cdn.example.com/pic.jpg",
                "caption": "sunset"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "container-1"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/iguser/media_publish"))
            .and(body_partial_json(serde_json::json!({ "creation_id": "container-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "media-1"
            })))
            .mount(&server)
            .await;

        let publisher = InstagramPublisher::with_base_url(server.uri());
        let remote = publisher
            .publish_single(&credential(), "sunset", Some(&image()))
            .await
            .unwrap();

        assert_eq!(remote.remote_id, "media-1");
        assert_eq!(
            remote.url.as_deref(),
            Some("https://www.instagram.com/p/media-1")
        );
    }

    #[tokio::test]
    async fn test_missing_media_rejected_without_api_call() {
        // No mocks mounted: any HTTP call would fail the test via a
        // transport error instead of MediaRequired.
        let publisher = InstagramPublisher::with_base_url("http://127.0.0.1:9");
        let err = publisher
            .publish_single(&credential(), "no picture", None)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::MediaRequired(Platform::Instagram)));
    }

    #[tokio::test]
    async fn test_video_container_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/iguser/media"))
            .and(body_partial_json(serde_json::json!({
                "media_type": "VIDEO",
                "video_url": "https://cdn.example.com/clip.mp4"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "container-2"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/iguser/media_publish"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "media-2"
            })))
            .mount(&server)
            .await;

        let publisher = InstagramPublisher::with_base_url(server.uri());
        let video = MediaRef {
            url: "https://cdn.example.com/clip.mp4".to_string(),
            media_type: MediaType::Video,
        };
        let remote = publisher
            .publish_single(&credential(), "clip", Some(&video))
            .await
            .unwrap();

        assert_eq!(remote.remote_id, "media-2");
    }
}
