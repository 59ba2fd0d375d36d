//! Result recorder: write and read path for run records.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::ApiKey;
use crate::config::RecorderConfig;
use crate::error::{StatusError, StatusResult};
use crate::platform::{KeyValueStore, Platform, Query};
use crate::probe::outcome::RunReport;
use crate::recorder::record::{record_key, strip_internal, to_item, SummaryRecord};

/// How long each record form is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retention {
    pub run_ttl: Duration,
    pub summary_ttl: Duration,
}

impl From<&RecorderConfig> for Retention {
    fn from(config: &RecorderConfig) -> Self {
        Self {
            run_ttl: Duration::from_secs(config.run_ttl_secs),
            summary_ttl: Duration::from_secs(config.summary_ttl_secs),
        }
    }
}

/// Filters accepted by the read path.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ReadQuery {
    pub service: Option<String>,
    pub region: Option<String>,
    pub limit: Option<usize>,
}

impl ReadQuery {
    fn to_query(&self) -> Query {
        let mut query = Query::all();
        if let Some(service) = &self.service {
            query = query.eq("service", service.as_str());
        }
        if let Some(region) = &self.region {
            query = query.eq("region", region.as_str());
        }
        query
    }
}

/// Persists reports into two expiring collections and reads them back.
pub struct ResultRecorder {
    runs: Arc<dyn KeyValueStore>,
    summaries: Arc<dyn KeyValueStore>,
    retention: Retention,
}

impl ResultRecorder {
    pub fn new(
        runs: Arc<dyn KeyValueStore>,
        summaries: Arc<dyn KeyValueStore>,
        retention: Retention,
    ) -> Self {
        Self {
            runs,
            summaries,
            retention,
        }
    }

    pub fn from_config(config: &RecorderConfig, platform: &Platform) -> Self {
        Self::new(
            platform.base(&config.runs_collection),
            platform.base(&config.summaries_collection),
            Retention::from(config),
        )
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Store a report and its summary, returning the shared key.
    ///
    /// A second write for the same `(timestamp, service, region)` overwrites
    /// the first. A run record never outlives a failed summary write.
    pub async fn record(&self, report: &RunReport) -> StatusResult<String> {
        let mut report = report.clone();
        report.seal();
        let key = record_key(report.timestamp, &report.service, &report.region);

        let run_item = to_item(&report, &key)?;
        self.runs.put(run_item, Some(self.retention.run_ttl)).await?;

        let summary_item = to_item(&SummaryRecord::from_report(&report), &key)?;
        if let Err(e) = self
            .summaries
            .put(summary_item, Some(self.retention.summary_ttl))
            .await
        {
            if let Err(rollback) = self.runs.delete(&key).await {
                tracing::error!(key = %key, error = %rollback, "Failed to remove orphaned run record");
            }
            return Err(e.into());
        }

        tracing::debug!(
            key = %key,
            service = %report.service,
            passed = report.passed,
            "Report recorded"
        );
        Ok(key)
    }

    /// Credential-gated write used by external submitters.
    ///
    /// The credential is checked before anything else touches the store.
    pub async fn submit(
        &self,
        api_key: &ApiKey,
        presented: Option<&str>,
        report: &RunReport,
    ) -> StatusResult<String> {
        api_key.verify(presented)?;
        let report = checked_submission(report)?;
        self.record(&report).await
    }

    /// Full run reports, newest first.
    pub async fn runs(&self, query: &ReadQuery) -> StatusResult<Vec<RunReport>> {
        read(self.runs.as_ref(), query, |r: &RunReport| r.timestamp).await
    }

    /// Summary records, newest first.
    pub async fn summaries(&self, query: &ReadQuery) -> StatusResult<Vec<SummaryRecord>> {
        read(self.summaries.as_ref(), query, |r: &SummaryRecord| r.timestamp).await
    }
}

/// Reject malformed submitted reports; a failed outcome without an error
/// gets the generic one, like outcomes built in-process.
fn checked_submission(report: &RunReport) -> StatusResult<RunReport> {
    if report.service.trim().is_empty() || report.region.trim().is_empty() {
        return Err(StatusError::InvalidReport(
            "report needs a service and a region".to_string(),
        ));
    }

    let mut report = report.clone();
    for (key, outcome) in report.outcomes.iter_mut() {
        if outcome.name != *key {
            return Err(StatusError::InvalidReport(format!(
                "outcome '{}' is filed under '{}'",
                outcome.name, key
            )));
        }
        if !outcome.passed && outcome.error().is_none() {
            outcome.details.insert(
                "error".to_string(),
                serde_json::Value::String("unknown error".to_string()),
            );
        }
    }
    Ok(report)
}

async fn read<T, F>(store: &dyn KeyValueStore, query: &ReadQuery, timestamp: F) -> StatusResult<Vec<T>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> u64,
{
    let items = store.fetch(&query.to_query()).await?;

    let mut records: Vec<T> = items
        .into_iter()
        .map(strip_internal)
        .filter_map(|item| match serde_json::from_value(item.into()) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable record");
                None
            }
        })
        .collect();

    records.sort_by_key(|r| std::cmp::Reverse(timestamp(r)));
    if let Some(limit) = query.limit {
        records.truncate(limit);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Item, MemoryBase, PlatformError, PlatformResult};
    use crate::probe::outcome::{Details, ProbeOutcome};

    fn recorder() -> (ResultRecorder, MemoryBase, MemoryBase) {
        let runs = MemoryBase::new();
        let summaries = MemoryBase::new();
        let recorder = ResultRecorder::new(
            Arc::new(runs.clone()),
            Arc::new(summaries.clone()),
            Retention {
                run_ttl: Duration::from_secs(86_400),
                summary_ttl: Duration::from_secs(7_776_000),
            },
        );
        (recorder, runs, summaries)
    }

    fn report(service: &str, region: &str, timestamp: u64, ok: bool) -> RunReport {
        let outcome = if ok {
            ProbeOutcome::success("ping", 0.1, Details::new())
        } else {
            ProbeOutcome::failure("ping", 0.1, "unreachable")
        };
        RunReport::new(service, region, timestamp, 0.2, vec![outcome])
    }

    #[tokio::test]
    async fn test_same_instant_overwrites() {
        let (recorder, runs, summaries) = recorder();
        recorder.record(&report("base", "eu", 100, false)).await.unwrap();
        let key = recorder.record(&report("base", "eu", 100, true)).await.unwrap();

        assert_eq!(key, "100-base-eu");
        assert_eq!(runs.len(), 1);
        assert_eq!(summaries.len(), 1);

        let stored = recorder.runs(&ReadQuery::default()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].passed);
    }

    #[tokio::test]
    async fn test_read_filters_and_order() {
        let (recorder, _, _) = recorder();
        recorder.record(&report("base", "eu", 100, true)).await.unwrap();
        recorder.record(&report("drive", "eu", 200, true)).await.unwrap();
        recorder.record(&report("drive", "us", 300, false)).await.unwrap();

        let drive = recorder
            .runs(&ReadQuery {
                service: Some("drive".into()),
                ..ReadQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(drive.len(), 2);
        assert!(drive.iter().all(|r| r.service == "drive"));
        assert_eq!(drive[0].timestamp, 300);

        let all = recorder.runs(&ReadQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let eu_summaries = recorder
            .summaries(&ReadQuery {
                region: Some("eu".into()),
                limit: Some(1),
                ..ReadQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(eu_summaries.len(), 1);
        assert_eq!(eu_summaries[0].service, "drive");
    }

    #[tokio::test]
    async fn test_records_carry_expiry() {
        let (recorder, runs, summaries) = recorder();
        recorder.record(&report("micro", "eu", 100, true)).await.unwrap();

        let run = runs.get("100-micro-eu").await.unwrap().unwrap();
        let summary = summaries.get("100-micro-eu").await.unwrap().unwrap();
        let run_expiry = run["__expires"].as_u64().unwrap();
        let summary_expiry = summary["__expires"].as_u64().unwrap();
        let gap = summary_expiry - run_expiry;
        assert!((7_689_600..=7_689_601).contains(&gap));
    }

    #[tokio::test]
    async fn test_submit_with_wrong_key_writes_nothing() {
        let (recorder, runs, summaries) = recorder();
        let api_key = ApiKey::new("right").unwrap();

        let err = recorder
            .submit(&api_key, Some("wrong"), &report("base", "eu", 1, true))
            .await
            .unwrap_err();
        assert!(matches!(err, StatusError::Authorization));
        assert!(runs.is_empty());
        assert!(summaries.is_empty());

        recorder
            .submit(&api_key, Some("right"), &report("base", "eu", 1, true))
            .await
            .unwrap();
        assert_eq!(runs.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_malformed_reports() {
        let (recorder, runs, _) = recorder();
        let api_key = ApiKey::new("right").unwrap();

        let err = recorder
            .submit(&api_key, Some("right"), &report("base", "", 1, true))
            .await
            .unwrap_err();
        assert!(matches!(err, StatusError::InvalidReport(_)));

        let mut misfiled = report("base", "eu", 1, true);
        let outcome = misfiled.outcomes.remove("ping").unwrap();
        misfiled.outcomes.insert("get".to_string(), outcome);
        let err = recorder
            .submit(&api_key, Some("right"), &misfiled)
            .await
            .unwrap_err();
        assert!(matches!(err, StatusError::InvalidReport(_)));
        assert!(runs.is_empty());
    }

    #[tokio::test]
    async fn test_submitted_failure_gets_an_error() {
        let (recorder, _, summaries) = recorder();
        let api_key = ApiKey::new("right").unwrap();

        let mut bare = report("base", "eu", 1, false);
        if let Some(outcome) = bare.outcomes.get_mut("ping") {
            outcome.details.clear();
        }
        recorder.submit(&api_key, Some("right"), &bare).await.unwrap();

        let stored = recorder.runs(&ReadQuery::default()).await.unwrap();
        assert_eq!(stored[0].outcomes["ping"].error(), Some("unknown error"));
        assert!(!stored[0].passed);
        assert_eq!(summaries.len(), 1);
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl KeyValueStore for BrokenStore {
        async fn put(
            &self,
            _: Item,
            _: Option<Duration>,
        ) -> PlatformResult<Item> {
            Err(PlatformError::Status { status: 503, body: "unavailable".into() })
        }
        async fn put_many(
            &self,
            _: Vec<Item>,
        ) -> PlatformResult<Vec<Item>> {
            unimplemented!()
        }
        async fn insert(
            &self,
            _: Item,
        ) -> PlatformResult<Item> {
            unimplemented!()
        }
        async fn get(&self, _: &str) -> PlatformResult<Option<Item>> {
            unimplemented!()
        }
        async fn delete(&self, _: &str) -> PlatformResult<()> {
            unimplemented!()
        }
        async fn update(&self, _: &str, _: Item) -> PlatformResult<()> {
            unimplemented!()
        }
        async fn fetch(&self, _: &Query) -> PlatformResult<Vec<Item>> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_persistence_error() {
        let recorder = ResultRecorder::new(
            Arc::new(BrokenStore),
            Arc::new(BrokenStore),
            Retention {
                run_ttl: Duration::from_secs(1),
                summary_ttl: Duration::from_secs(1),
            },
        );
        let err = recorder.record(&report("base", "eu", 1, true)).await.unwrap_err();
        assert!(matches!(err, StatusError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_failed_summary_removes_run_record() {
        let runs = MemoryBase::new();
        let recorder = ResultRecorder::new(
            Arc::new(runs.clone()),
            Arc::new(BrokenStore),
            Retention {
                run_ttl: Duration::from_secs(60),
                summary_ttl: Duration::from_secs(60),
            },
        );
        let err = recorder.record(&report("base", "eu", 1, true)).await.unwrap_err();
        assert!(matches!(err, StatusError::Persistence(_)));
        assert!(runs.is_empty());
    }
}
