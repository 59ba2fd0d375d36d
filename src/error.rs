//! Crate-level error taxonomy.
//!
//! Probe failures are deliberately absent: they are converted into failed
//! outcomes inside the batch runner and never surface as errors.

use thiserror::Error;

use crate::platform::PlatformError;

/// Errors surfaced by the runner, recorder and dispatch layers.
#[derive(Debug, Error)]
pub enum StatusError {
    /// Missing or invalid identifying parameter at construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Storage write or read failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PlatformError),

    /// Post-run cleanup of probe data failed.
    #[error("cleanup failed: {0}")]
    Cleanup(PlatformError),

    /// Credential mismatch at the write boundary.
    #[error("authorization failed")]
    Authorization,

    /// A submitted report failed input checks.
    #[error("invalid report: {0}")]
    InvalidReport(String),

    /// Unknown service or probe-set name.
    #[error("not found: {0}")]
    NotFound(String),

    /// The batch did not complete inside its deadline.
    #[error("batch for {service} timed out after {secs} seconds")]
    Timeout { service: String, secs: u64 },

    /// A registered probe produced no outcome.
    #[error("probe {0} produced no outcome")]
    MissingOutcome(String),
}

pub type StatusResult<T> = Result<T, StatusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StatusError::Timeout {
            service: "drive".into(),
            secs: 60,
        };
        assert_eq!(err.to_string(), "batch for drive timed out after 60 seconds");

        let err = StatusError::NotFound("queue".into());
        assert_eq!(err.to_string(), "not found: queue");
    }
}
