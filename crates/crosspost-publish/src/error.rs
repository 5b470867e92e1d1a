//! Error types for the publish path.

use thiserror::Error;

use crosspost_model::Platform;
use crosspost_store::StoreError;

/// Errors that can occur while publishing to a platform.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The owner has no active connection for this platform.
    #[error("{0} not connected")]
    NotConnected(Platform),

    /// The platform mandates media and the post carries none.
    #[error("{0} requires an image")]
    MediaRequired(Platform),

    /// No publisher is registered for this platform.
    #[error("no publisher registered for {0}")]
    NoPublisher(Platform),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform API rejected the request.
    #[error("{platform} API error ({status}): {message}")]
    Api {
        platform: Platform,
        status: u16,
        message: String,
    },

    /// The platform returned something unusable.
    #[error("invalid response from {platform}: {message}")]
    InvalidResponse { platform: Platform, message: String },

    /// Connection lookup failed at the store layer.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PublishError {
    /// Whether a later dispatch attempt could plausibly succeed.
    ///
    /// Transport failures, rate limits, and server-side errors are worth
    /// retrying; missing connections, missing media, and request rejections
    /// are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            PublishError::Http(_) => true,
            PublishError::Api { status, .. } => *status == 429 || *status >= 500,
            PublishError::Store(_) => true,
            PublishError::NotConnected(_)
            | PublishError::MediaRequired(_)
            | PublishError::NoPublisher(_)
            | PublishError::InvalidResponse { .. } => false,
        }
    }
}
