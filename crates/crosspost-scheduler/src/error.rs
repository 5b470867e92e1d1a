//! Error types for the scheduler.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crosspost_store::StoreError;

/// Errors that can occur in scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduled time lies further in the past than the grace window.
    #[error("scheduled time is in the past: {0}")]
    InPast(DateTime<Utc>),

    /// Scheduled time lies beyond the scheduling horizon.
    #[error("scheduled time is too far in the future: {0}")]
    TooFarAhead(DateTime<Utc>),

    /// A live job already exists under this key.
    #[error("job already exists: {0}")]
    JobExists(String),

    /// Job not found.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Post-store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
