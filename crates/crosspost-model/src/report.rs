//! Publish results and the outcome classification handed to the job queue.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::Platform;

/// Outcome of publishing to a single platform.
///
/// A chain publish still produces exactly one of these per platform: the
/// first chunk's remote identity on success, the first failing chunk's error
/// otherwise. Intermediate chunk ids are transient chaining state and are
/// not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlatformResult {
    Success {
        remote_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    Failure {
        error: String,
    },
}

impl PlatformResult {
    pub fn is_error(&self) -> bool {
        matches!(self, PlatformResult::Failure { .. })
    }
}

/// Results persisted on a post.
///
/// Normally the per-platform map; the reconciliation sweep writes a
/// post-level error when a scheduled post expired without ever dispatching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostResults {
    PerPlatform(BTreeMap<Platform, PlatformResult>),
    Aborted { error: String },
}

impl PostResults {
    pub fn aborted(error: impl Into<String>) -> Self {
        PostResults::Aborted {
            error: error.into(),
        }
    }
}

/// How a dispatch attempt should be treated by the job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Every platform succeeded.
    Success,
    /// At least one platform failed in a way a later attempt might fix.
    Retryable,
    /// At least one platform failed and no retry will help.
    Terminal,
}

/// Aggregate result of fanning one post out to its platforms.
///
/// Retryability is a transient classification, kept apart from the persisted
/// results so the queue's control flow never doubles as the error payload.
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    results: BTreeMap<Platform, PlatformResult>,
    retryable: BTreeSet<Platform>,
}

impl PublishReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(
        &mut self,
        platform: Platform,
        remote_id: impl Into<String>,
        url: Option<String>,
    ) {
        self.results.insert(
            platform,
            PlatformResult::Success {
                remote_id: remote_id.into(),
                url,
            },
        );
    }

    pub fn record_failure(
        &mut self,
        platform: Platform,
        error: impl Into<String>,
        retryable: bool,
    ) {
        self.results
            .insert(platform, PlatformResult::Failure { error: error.into() });
        if retryable {
            self.retryable.insert(platform);
        }
    }

    pub fn results(&self) -> &BTreeMap<Platform, PlatformResult> {
        &self.results
    }

    pub fn has_error(&self) -> bool {
        self.results.values().any(PlatformResult::is_error)
    }

    /// Collapse the report for the queue: success, retryable, or terminal.
    pub fn outcome(&self) -> PublishOutcome {
        if !self.has_error() {
            PublishOutcome::Success
        } else if self.retryable.is_empty() {
            PublishOutcome::Terminal
        } else {
            PublishOutcome::Retryable
        }
    }

    pub fn into_results(self) -> PostResults {
        PostResults::PerPlatform(self.results)
    }
}
