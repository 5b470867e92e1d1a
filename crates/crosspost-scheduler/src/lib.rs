//! Delayed-job scheduling for post publication.
//!
//! This crate provides:
//! - A durable-port job store keyed by post id, enforcing at most one live
//!   job per post
//! - A scheduler service with validation, cancellation, atomic reschedule,
//!   idempotent dispatch with a retry budget, and crash recovery from the
//!   Post table
//! - A periodic reconciliation sweep that heals drift between posts and
//!   jobs and enforces retention windows

mod error;
mod service;
mod store;
mod sweep;
mod types;

pub use error::SchedulerError;
pub use service::{PostPublisher, SchedulerService};
pub use store::{InMemoryJobStore, JobStore};
pub use sweep::{ReconciliationSweep, SweepConfig};
pub use types::{DEFAULT_MAX_ATTEMPTS, Job, JobState, JobStatusInfo, QueueState, job_key};
