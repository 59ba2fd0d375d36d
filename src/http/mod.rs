//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! Request
//!     → server.rs (router, trace/timeout/CORS layers)
//!     → auth.rs (credential gate on write and trigger routes)
//!     → handlers.rs (read results, submit a report, run suites now)
//!     → error.rs (StatusError → status code + JSON body)
//! ```
//!
//! # Design Decisions
//! - Reads are public; the dashboard polls them cross-origin
//! - Triggers dispatch in-process to the monitor

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use server::{AppState, StatusServer};
