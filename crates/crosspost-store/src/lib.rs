//! Persistence ports for Crosspost, plus in-memory reference stores.
//!
//! The Post table is the single source of truth for scheduling state; the
//! job queue is a derived accelerator rebuilt from it on startup. These
//! traits are the seams a real database backend plugs into; the in-memory
//! implementations back the daemon's default wiring and the test suites.

mod connection;
mod error;
mod memory;
mod posts;
mod publish_log;

pub use connection::{ConnectionStore, Credential};
pub use error::StoreError;
pub use memory::{InMemoryConnectionStore, InMemoryPostStore, InMemoryPublishLogStore};
pub use posts::PostStore;
pub use publish_log::{PublishLogEntry, PublishLogStore};
