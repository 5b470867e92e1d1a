//! Error types for the persistence ports.

use thiserror::Error;

use crosspost_model::PostStatus;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Post not found.
    #[error("post not found: {0}")]
    PostNotFound(String),

    /// The post status machine forbids this transition.
    #[error("invalid status transition for post {post_id}: {from} -> {to}")]
    InvalidTransition {
        post_id: String,
        from: PostStatus,
        to: PostStatus,
    },

    /// Published posts cannot be deleted or rewritten.
    #[error("published posts are immutable: {0}")]
    PublishedImmutable(String),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}
