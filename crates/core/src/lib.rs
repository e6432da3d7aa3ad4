//! EdgeFlush core library.
//!
//! This crate provides the building blocks for purging CDN edge caches when
//! published content changes: configuration, path-to-URL mapping, EdgeGrid
//! request signing, purge dispatch, failure alerting and the agent that ties
//! them together.

pub mod agent;
pub mod config;
pub mod edgegrid;
pub mod errors;
pub mod mapping;
pub mod models;
pub mod notify;
pub mod purge;

// Re-exports for convenience.
pub use agent::PurgeAgent;
pub use config::AppConfig;
pub use mapping::{MappingStore, PathMapper};
pub use notify::{AlertSink, LogAlertSink, Notifier};
pub use purge::{HttpTransport, PurgeDispatcher};
