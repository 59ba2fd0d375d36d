//! Stored record shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::{Item, PlatformError, EXPIRES_FIELD, KEY_FIELD};
use crate::probe::outcome::RunReport;

/// Separator between the parts of a record key.
pub const KEY_SEPARATOR: char = '-';

/// Deterministic primary key: same instant, service and region → same record.
pub fn record_key(timestamp: u64, service: &str, region: &str) -> String {
    format!("{timestamp}{KEY_SEPARATOR}{service}{KEY_SEPARATOR}{region}")
}

/// Per-probe line of a summary record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSummary {
    pub passed: bool,
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Flat dashboard-facing record of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub service: String,
    pub region: String,
    pub passed: bool,
    pub timestamp: u64,
    pub duration: f64,
    #[serde(default)]
    pub details: BTreeMap<String, ProbeSummary>,
}

impl SummaryRecord {
    pub fn from_report(report: &RunReport) -> Self {
        let details = report
            .outcomes
            .iter()
            .map(|(name, outcome)| {
                (
                    name.clone(),
                    ProbeSummary {
                        passed: outcome.passed,
                        duration: outcome.duration,
                        error: outcome.error().map(str::to_string),
                    },
                )
            })
            .collect();

        Self {
            service: report.service.clone(),
            region: report.region.clone(),
            passed: report.all_passed(),
            timestamp: report.timestamp,
            duration: report.duration,
            details,
        }
    }
}

/// Serialize a record into a store item under `key`.
pub fn to_item<T: Serialize>(record: &T, key: &str) -> Result<Item, PlatformError> {
    let mut item = match serde_json::to_value(record)? {
        Value::Object(map) => map,
        other => {
            let mut map = Item::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    item.insert(KEY_FIELD.to_string(), Value::String(key.to_string()));
    Ok(item)
}

/// Remove storage-internal attributes before returning an item to readers.
pub fn strip_internal(mut item: Item) -> Item {
    item.remove(KEY_FIELD);
    item.remove(EXPIRES_FIELD);
    item
}
