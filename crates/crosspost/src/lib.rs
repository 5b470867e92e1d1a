//! Crosspost: scheduled multi-platform post publication.
//!
//! The library surface wires the workspace crates together: the
//! [`service::PostService`] is the API a transport layer (HTTP, CLI)
//! consumes, and [`daemon`] runs the scheduler worker and reconciliation
//! sweep until shutdown.

pub mod daemon;
pub mod service;
