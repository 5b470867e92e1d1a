//! Publishing: the per-platform publisher capability, the chain-publish
//! algorithm for over-length content, and the orchestrator that fans one
//! post out to every platform it targets.

mod chain;
pub mod clients;
mod error;
mod orchestrator;
mod publisher;
mod registry;

pub use chain::publish_chain;
pub use error::PublishError;
pub use orchestrator::PublishOrchestrator;
pub use publisher::{MediaRef, PlatformPublisher, RemotePost};
pub use registry::PublisherRegistry;
