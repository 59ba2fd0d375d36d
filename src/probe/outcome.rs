//! Report model: single probe outcomes and aggregated runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open diagnostic payload attached to an outcome.
pub type Details = Map<String, Value>;

/// Result of one probe invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub name: String,
    pub passed: bool,
    /// Seconds spent inside the probe body.
    pub duration: f64,
    #[serde(default)]
    pub details: Details,
}

impl ProbeOutcome {
    pub fn success(name: impl Into<String>, duration: f64, details: Details) -> Self {
        Self {
            name: name.into(),
            passed: true,
            duration: duration.max(0.0),
            details,
        }
    }

    /// A failed outcome always carries an `error` entry.
    pub fn failure(name: impl Into<String>, duration: f64, error: impl Into<String>) -> Self {
        let mut error: String = error.into();
        if error.is_empty() {
            error = "unknown error".to_string();
        }
        let mut details = Details::new();
        details.insert("error".to_string(), Value::String(error));
        Self {
            name: name.into(),
            passed: false,
            duration: duration.max(0.0),
            details,
        }
    }

    /// The failure description, if any.
    pub fn error(&self) -> Option<&str> {
        self.details.get("error").and_then(Value::as_str)
    }
}

/// Normalize a probe's return value into a details map.
///
/// `null` becomes an empty map, objects are kept, any other value is
/// wrapped as `{"value": ...}`.
pub fn details_from(value: Value) -> Details {
    match value {
        Value::Null => Details::new(),
        Value::Object(map) => map,
        other => {
            let mut details = Details::new();
            details.insert("value".to_string(), other);
            details
        }
    }
}

/// Aggregated outcome of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(rename = "tests")]
    pub outcomes: BTreeMap<String, ProbeOutcome>,
    pub service: String,
    pub region: String,
    /// Seconds since epoch at run start.
    pub timestamp: u64,
    /// Seconds for the whole batch.
    pub duration: f64,
    /// Logical AND over all outcomes. Recomputed by [`RunReport::seal`].
    #[serde(default)]
    pub passed: bool,
}

impl RunReport {
    pub fn new(
        service: impl Into<String>,
        region: impl Into<String>,
        timestamp: u64,
        duration: f64,
        outcomes: impl IntoIterator<Item = ProbeOutcome>,
    ) -> Self {
        let mut report = Self {
            outcomes: outcomes.into_iter().map(|o| (o.name.clone(), o)).collect(),
            service: service.into(),
            region: region.into(),
            timestamp,
            duration: duration.max(0.0),
            passed: false,
        };
        report.seal();
        report
    }

    /// True when every outcome passed. An empty report passes.
    pub fn all_passed(&self) -> bool {
        self.outcomes.values().all(|o| o.passed)
    }

    /// Bring the stored `passed` flag in line with the outcomes.
    pub fn seal(&mut self) {
        self.passed = self.all_passed();
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.values().filter(|o| !o.passed)
    }
}
