//! Reqwest-backed publishers for the supported platforms.
//!
//! Each client takes its base URL at construction so tests can point it at
//! a mock server. Transport policy is uniform: 10 s connect timeout, 30 s
//! request timeout, errors mapped to [`PublishError::Api`] with the
//! platform's error message extracted when the body is parseable.
//!
//! [`PublishError::Api`]: crate::PublishError::Api

mod facebook;
mod instagram;
mod threads;
mod twitter;

pub use facebook::FacebookPublisher;
pub use instagram::InstagramPublisher;
pub use threads::ThreadsPublisher;
pub use twitter::TwitterPublisher;

use std::time::Duration;

use crosspost_model::Platform;

use crate::PublishError;

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build HTTP client")
}

/// Map a non-success Graph-style response (`{"error": {"message": ...}}`)
/// to an API error, falling back to the raw body.
pub(crate) async fn graph_api_error(
    platform: Platform,
    response: reqwest::Response,
) -> PublishError {
    let status = response.status().as_u16();
    let message = match response.text().await {
        Ok(text) => serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or(text),
        Err(e) => format!("failed to read response: {e}"),
    };

    PublishError::Api {
        platform,
        status,
        message,
    }
}
