//! The publish audit-log port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crosspost_model::Platform;

use crate::StoreError;

/// One audit row per platform outcome of a publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishLogEntry {
    pub owner_id: String,
    pub post_id: String,
    pub platform: Platform,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    pub logged_at: DateTime<Utc>,
}

impl PublishLogEntry {
    pub fn new(
        owner_id: impl Into<String>,
        post_id: impl Into<String>,
        platform: Platform,
        success: bool,
        error: Option<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            post_id: post_id.into(),
            platform,
            success,
            error,
            logged_at: Utc::now(),
        }
    }
}

/// Append-only publish audit log.
#[async_trait]
pub trait PublishLogStore: Send + Sync {
    async fn append(&self, entry: PublishLogEntry) -> Result<(), StoreError>;

    /// Storage hygiene: drop log rows older than `cutoff`. Returns how many
    /// were deleted.
    async fn delete_logged_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}
