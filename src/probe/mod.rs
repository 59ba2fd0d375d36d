//! Probe execution subsystem.
//!
//! # Data Flow
//! ```text
//! Trigger (scheduler tick, HTTP "run now")
//!     → monitor.rs (service name → runner, unknown names rejected)
//!     → runner.rs (fan out probes, join, time, assemble report)
//!         → registry.rs (named probes, error/panic → failed outcome)
//!     → outcome.rs (ProbeOutcome, RunReport)
//!     → recorder (persist), then cleanup hook
//! ```
//!
//! # Design Decisions
//! - Probes are independent; a failure never aborts the batch
//! - Report `passed` is the AND of all outcomes, never derived from transport status
//! - No retries: the next scheduled run is the retry

pub mod monitor;
pub mod outcome;
pub mod registry;
pub mod runner;
pub mod service;

pub use monitor::Monitor;
pub use outcome::{Details, ProbeOutcome, RunReport};
pub use registry::{ensure, ProbeError, ProbeRegistry};
pub use runner::{BatchRunner, RunResult};
pub use service::Service;
