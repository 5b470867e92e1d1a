//! Platform-aware text splitting.
//!
//! Turns over-length text into an ordered sequence of platform-compliant
//! chunks without breaking URLs, hashtags, or mentions, preferring sentence
//! boundaries and numbering the chunks when more than one results.
//!
//! Splitting is deterministic and total: it never fails. The one documented
//! limitation is a single unsplittable token longer than the platform limit,
//! which is surfaced as an oversized chunk rather than an error.

mod counting;
mod extract;
mod sentences;
mod split;

pub use counting::measure;
pub use split::{SplitResult, split, split_for_platforms};
