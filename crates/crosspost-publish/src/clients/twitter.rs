//! Twitter API v2 publisher.
//!
//! Long content goes out as a thread: each chunk replies to the previous
//! tweet via `reply.in_reply_to_tweet_id`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crosspost_model::Platform;
use crosspost_store::Credential;

use crate::clients::http_client;
use crate::{MediaRef, PlatformPublisher, PublishError, RemotePost};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com/2";

pub struct TwitterPublisher {
    http: reqwest::Client,
    base_url: String,
}

impl TwitterPublisher {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: http_client(),
            base_url: base_url.into(),
        }
    }

    async fn post_tweet(
        &self,
        access_token: &str,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<RemotePost, PublishError> {
        let url = format!("{}/tweets", self.base_url);

        let mut body = json!({ "text": text });
        if let Some(parent) = reply_to {
            body["reply"] = json!({ "in_reply_to_tweet_id": parent });
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::api_error(status.as_u16(), response).await);
        }

        #[derive(Deserialize)]
        struct Tweet {
            id: String,
        }
        #[derive(Deserialize)]
        struct Wrapper {
            data: Tweet,
        }

        let wrapper: Wrapper = response.json().await?;
        let tweet_id = wrapper.data.id;
        let url = format!("https://twitter.com/i/web/status/{tweet_id}");

        Ok(RemotePost {
            remote_id: tweet_id,
            url: Some(url),
        })
    }

    /// Twitter error bodies carry `detail` or an `errors[].message` list.
    async fn api_error(status: u16, response: reqwest::Response) -> PublishError {
        let message = match response.text().await {
            Ok(text) => serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| {
                    v["detail"]
                        .as_str()
                        .or_else(|| v["errors"][0]["message"].as_str())
                        .map(String::from)
                })
                .unwrap_or(text),
            Err(e) => format!("failed to read response: {e}"),
        };

        PublishError::Api {
            platform: Platform::Twitter,
            status,
            message,
        }
    }
}

impl Default for TwitterPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformPublisher for TwitterPublisher {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn publish_single(
        &self,
        credential: &Credential,
        text: &str,
        _media: Option<&MediaRef>,
    ) -> Result<RemotePost, PublishError> {
        self.post_tweet(&credential.access_token, text, None).await
    }

    async fn publish_chained(
        &self,
        credential: &Credential,
        text: &str,
        parent_remote_id: &str,
    ) -> Result<RemotePost, PublishError> {
        self.post_tweet(&credential.access_token, text, Some(parent_remote_id))
            .await
    }
}
