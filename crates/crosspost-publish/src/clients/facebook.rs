//! Facebook Pages publisher.
//!
//! Publishes through the first of the owner's pages: a photo post when the
//! post carries media, a feed post otherwise. Chained chunks continue as
//! comments on the parent post.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crosspost_model::Platform;
use crosspost_store::Credential;

use crate::clients::{graph_api_error, http_client};
use crate::{MediaRef, PlatformPublisher, PublishError, RemotePost};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v19.0";

pub struct FacebookPublisher {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Page {
    id: String,
    access_token: String,
}

#[derive(Deserialize)]
struct PagesResponse {
    #[serde(default)]
    data: Vec<Page>,
}

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

impl FacebookPublisher {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: http_client(),
            base_url: base_url.into(),
        }
    }

    /// The user's first page. Page selection is not surfaced yet.
    async fn first_page(&self, user_access_token: &str) -> Result<Page, PublishError> {
        let url = format!("{}/me/accounts", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("access_token", user_access_token),
                ("fields", "id,name,access_token"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(graph_api_error(Platform::Facebook, response).await);
        }

        let pages: PagesResponse = response.json().await?;
        pages
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PublishError::InvalidResponse {
                platform: Platform::Facebook,
                message: "no Facebook pages found".to_string(),
            })
    }

    async fn post_json(
        &self,
        url: &str,
        page_token: &str,
        body: serde_json::Value,
    ) -> Result<String, PublishError> {
        let response = self
            .http
            .post(url)
            .query(&[("access_token", page_token)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(graph_api_error(Platform::Facebook, response).await);
        }

        let created: IdResponse = response.json().await?;
        Ok(created.id)
    }
}

impl Default for FacebookPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformPublisher for FacebookPublisher {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn publish_single(
        &self,
        credential: &Credential,
        text: &str,
        media: Option<&MediaRef>,
    ) -> Result<RemotePost, PublishError> {
        let page = self.first_page(&credential.access_token).await?;

        let post_id = match media {
            Some(media) => {
                let url = format!("{}/{}/photos", self.base_url, page.id);
                self.post_json(
                    &url,
                    &page.access_token,
                    json!({ "url": media.url, "caption": text, "published": true }),
                )
                .await?
            }
            None => {
                let url = format!("{}/{}/feed", self.base_url, page.id);
                self.post_json(
                    &url,
                    &page.access_token,
                    json!({ "message": text, "published": true }),
                )
                .await?
            }
        };

        let url = format!("https://www.facebook.com/{post_id}");
        Ok(RemotePost {
            remote_id: post_id,
            url: Some(url),
        })
    }

    async fn publish_chained(
        &self,
        credential: &Credential,
        text: &str,
        parent_remote_id: &str,
    ) -> Result<RemotePost, PublishError> {
        let page = self.first_page(&credential.access_token).await?;

        let url = format!("{}/{}/comments", self.base_url, parent_remote_id);
        let comment_id = self
            .post_json(&url, &page.access_token, json!({ "message": text }))
            .await?;

        Ok(RemotePost {
            remote_id: comment_id,
            url: None,
        })
    }
}
