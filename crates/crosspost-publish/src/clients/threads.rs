//! Threads Graph API publisher.
//!
//! Posting is a two-step container flow: create a media container, then
//! publish it. Chained chunks reply to the previous published thread via
//! `reply_to_id`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crosspost_model::Platform;
use crosspost_store::Credential;

use crate::clients::{graph_api_error, http_client};
use crate::{MediaRef, PlatformPublisher, PublishError, RemotePost};

const DEFAULT_BASE_URL: &str = "https://graph.threads.net/v1.0";

pub struct ThreadsPublisher {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

impl ThreadsPublisher {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: http_client(),
            base_url: base_url.into(),
        }
    }

    /// Step 1: create a (possibly replying) text container.
    async fn create_container(
        &self,
        credential: &Credential,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<String, PublishError> {
        let url = format!("{}/{}/threads", self.base_url, credential.platform_user_id);

        let mut body = json!({ "media_type": "TEXT", "text": text });
        if let Some(parent) = reply_to {
            body["reply_to_id"] = json!(parent);
        }

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", credential.access_token.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(graph_api_error(Platform::Threads, response).await);
        }

        let container: IdResponse = response.json().await?;
        Ok(container.id)
    }

    /// Step 2: publish the container.
    async fn publish_container(
        &self,
        credential: &Credential,
        container_id: &str,
    ) -> Result<RemotePost, PublishError> {
        let url = format!(
            "{}/{}/threads_publish",
            self.base_url, credential.platform_user_id
        );

        let response = self
            .http
            .post(&url)
            .query(&[("access_token", credential.access_token.as_str())])
            .json(&json!({ "creation_id": container_id }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(graph_api_error(Platform::Threads, response).await);
        }

        let published: IdResponse = response.json().await?;
        let url = format!("https://www.threads.net/t/{}", published.id);

        Ok(RemotePost {
            remote_id: published.id,
            url: Some(url),
        })
    }
}

impl Default for ThreadsPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformPublisher for ThreadsPublisher {
    fn platform(&self) -> Platform {
        Platform::Threads
    }

    async fn publish_single(
        &self,
        credential: &Credential,
        text: &str,
        _media: Option<&MediaRef>,
    ) -> Result<RemotePost, PublishError> {
        let container_id = self.create_container(credential, text, None).await?;
        self.publish_container(credential, &container_id).await
    }

    async fn publish_chained(
        &self,
        credential: &Credential,
        text: &str,
        parent_remote_id: &str,
    ) -> Result<RemotePost, PublishError> {
        let container_id = self
            .create_container(credential, text, Some(parent_remote_id))
            .await?;
        self.publish_container(credential, &container_id).await
    }
}
