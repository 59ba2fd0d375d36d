//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Runner, recorder, scheduler and HTTP layer produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (probe/batch counters and histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log aggregation)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (service, probe, region) on every event
//! - Metrics are cheap no-ops when no exporter is installed

pub mod logging;
pub mod metrics;
