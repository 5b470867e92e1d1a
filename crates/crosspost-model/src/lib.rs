//! Shared domain types for Crosspost.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//! platforms and their posting limits, posts and their status machine, and
//! the per-platform publish results that get persisted alongside a post.

mod platform;
mod post;
mod report;

pub use platform::{Platform, UnknownPlatform};
pub use post::{MediaType, Post, PostStatus};
pub use report::{PlatformResult, PostResults, PublishOutcome, PublishReport};
