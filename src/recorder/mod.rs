//! Result persistence subsystem.
//!
//! # Data Flow
//! ```text
//! RunReport (from the batch runner or an authorized submitter)
//!     → record.rs (key = timestamp-service-region, summary form)
//!     → results.rs (put with TTL into runs + summaries collections)
//!
//! Read path:
//!     ReadQuery (service?, region?, limit?)
//!     → fetch → strip key/__expires → newest first
//! ```
//!
//! # Design Decisions
//! - Keys are deterministic, so repeated writes overwrite
//! - TTLs come from configuration, one per record form
//! - Write failures are returned, never swallowed

pub mod record;
pub mod results;

pub use record::{record_key, ProbeSummary, SummaryRecord};
pub use results::{ReadQuery, ResultRecorder, Retention};
