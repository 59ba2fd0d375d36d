//! Synthetic monitoring for a hosted platform: probe batches, result records
//! and the JSON read API a status dashboard consumes.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod platform;
pub mod probe;
pub mod recorder;
pub mod scheduler;
pub mod suites;

pub use config::schema::StatusConfig;
pub use error::{StatusError, StatusResult};
pub use http::StatusServer;
pub use lifecycle::{App, Shutdown};
pub use probe::{BatchRunner, Monitor, ProbeRegistry, RunReport, Service};
pub use recorder::ResultRecorder;
pub use scheduler::Scheduler;
