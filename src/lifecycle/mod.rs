//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → platform handles → recorder → runners → App
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C → broadcast → scheduler loop exits, server drains → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then stores, then runners
//! - Fail fast: any construction error is fatal, no partial App
//! - One broadcast channel reaches every long-running task

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::App;
