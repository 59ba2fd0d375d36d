//! Batch runner.
//!
//! # Responsibilities
//! - Dispatch every registered probe (concurrently by default)
//! - Isolate failures per probe
//! - Assemble a [`RunReport`] with one outcome per registered probe
//! - Hand the report to the recorder, then run the cleanup hook
//!
//! # Design Decisions
//! - Fan-out/fan-in on the calling task; probes only suspend on their own I/O
//! - The whole batch has a deadline; on expiry nothing is persisted
//! - Cleanup is owned by a guard so it also runs when the run is dropped;
//!   cleanup spawned from a dropped run is tracked so shutdown can drain it
//! - Runs of one runner never overlap: probes share the service's scratch
//!   collection, so the next run waits until the previous one has cleaned up

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time;
use tokio_util::task::TaskTracker;

use crate::config::ExecutionPolicy;
use crate::error::{StatusError, StatusResult};
use crate::observability::metrics;
use crate::platform::PlatformError;
use crate::probe::outcome::{ProbeOutcome, RunReport};
use crate::probe::registry::ProbeRegistry;
use crate::recorder::ResultRecorder;

/// Post-run hook that removes residual probe data and releases sessions.
pub type CleanupHook = Arc<dyn Fn() -> BoxFuture<'static, Result<(), PlatformError>> + Send + Sync>;

pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything a caller learns from one run.
#[derive(Debug)]
pub struct RunResult {
    pub report: RunReport,
    /// Storage key written by the recorder, when one is attached and the write worked.
    pub recorded: Option<String>,
    /// Recorder failure; the report above is still valid.
    pub persistence_error: Option<StatusError>,
    /// Cleanup failure; the report above is still valid.
    pub cleanup_error: Option<StatusError>,
}

/// Runs the probes of one monitored service.
pub struct BatchRunner {
    service: String,
    region: String,
    registry: ProbeRegistry,
    policy: ExecutionPolicy,
    batch_timeout: Duration,
    cleanup: Option<CleanupHook>,
    recorder: Option<Arc<ResultRecorder>>,
    tracker: TaskTracker,
    serial: Arc<Mutex<()>>,
}

impl BatchRunner {
    /// Bind a registry to a service and region. Both must be non-empty.
    pub fn new(
        service: impl Into<String>,
        region: impl Into<String>,
        registry: ProbeRegistry,
    ) -> StatusResult<Self> {
        let service = service.into();
        let region = region.into();
        if service.trim().is_empty() {
            return Err(StatusError::Configuration(
                "service name must be a non-empty string".to_string(),
            ));
        }
        if region.trim().is_empty() {
            return Err(StatusError::Configuration("no region provided".to_string()));
        }

        Ok(Self {
            service,
            region,
            registry,
            policy: ExecutionPolicy::Concurrent,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
            cleanup: None,
            recorder: None,
            tracker: TaskTracker::new(),
            serial: Arc::new(Mutex::new(())),
        })
    }

    pub fn with_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn with_cleanup<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<(), PlatformError>> + Send + Sync + 'static,
    {
        self.cleanup = Some(Arc::new(hook));
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<ResultRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Track cleanup spawned by dropped runs on a shared tracker.
    pub fn with_tracker(mut self, tracker: TaskTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Run every probe once and produce a report.
    ///
    /// Fails only when the batch itself cannot complete (deadline, missing
    /// outcome). Probe, persistence and cleanup failures are reported inside
    /// the returned [`RunResult`].
    pub async fn run(&self) -> StatusResult<RunResult> {
        let serial = self.serial.clone().lock_owned().await;
        let timestamp = unix_now();
        let guard = CleanupGuard::new(
            &self.service,
            self.cleanup.clone(),
            self.tracker.clone(),
            serial,
        );

        tracing::info!(
            service = %self.service,
            region = %self.region,
            probes = self.registry.len(),
            policy = ?self.policy,
            "Batch starting"
        );

        let started = Instant::now();
        let outcomes = match time::timeout(self.batch_timeout, self.dispatch()).await {
            Ok(outcomes) => outcomes,
            Err(_) => {
                tracing::error!(
                    service = %self.service,
                    timeout_secs = self.batch_timeout.as_secs(),
                    "Batch deadline elapsed, discarding run"
                );
                guard.finish().await;
                return Err(StatusError::Timeout {
                    service: self.service.clone(),
                    secs: self.batch_timeout.as_secs(),
                });
            }
        };
        let duration = started.elapsed().as_secs_f64();

        let report = match self.assemble(outcomes, timestamp, duration) {
            Ok(report) => report,
            Err(e) => {
                guard.finish().await;
                return Err(e);
            }
        };

        tracing::info!(
            service = %report.service,
            region = %report.region,
            passed = report.passed,
            failed = report.failures().count(),
            duration = report.duration,
            "Batch complete"
        );
        metrics::record_batch(&report.service, report.passed, report.duration);

        let (recorded, persistence_error) = match &self.recorder {
            Some(recorder) => match recorder.record(&report).await {
                Ok(key) => (Some(key), None),
                Err(e) => {
                    tracing::error!(service = %report.service, error = %e, "Failed to persist report");
                    metrics::record_persistence_failure(&report.service);
                    (None, Some(e))
                }
            },
            None => (None, None),
        };

        let cleanup_error = guard.finish().await;

        Ok(RunResult {
            report,
            recorded,
            persistence_error,
            cleanup_error,
        })
    }

    async fn dispatch(&self) -> Vec<ProbeOutcome> {
        match self.policy {
            ExecutionPolicy::Concurrent => {
                join_all(self.registry.iter().map(|probe| probe.execute())).await
            }
            ExecutionPolicy::Sequential => {
                let mut outcomes = Vec::with_capacity(self.registry.len());
                for probe in self.registry.iter() {
                    outcomes.push(probe.execute().await);
                }
                outcomes
            }
        }
    }

    fn assemble(
        &self,
        outcomes: Vec<ProbeOutcome>,
        timestamp: u64,
        duration: f64,
    ) -> StatusResult<RunReport> {
        for name in self.registry.names() {
            let Some(outcome) = outcomes.iter().find(|o| o.name == name) else {
                tracing::error!(service = %self.service, probe = name, "Probe never reported");
                return Err(StatusError::MissingOutcome(name.to_string()));
            };

            metrics::record_probe(&self.service, name, outcome.passed, outcome.duration);
            if let Some(error) = outcome.error() {
                tracing::warn!(
                    service = %self.service,
                    probe = name,
                    duration = outcome.duration,
                    error = error,
                    "Probe failed"
                );
            } else {
                tracing::debug!(service = %self.service, probe = name, duration = outcome.duration, "Probe passed");
            }
        }

        Ok(RunReport::new(
            self.service.clone(),
            self.region.clone(),
            timestamp,
            duration,
            outcomes,
        ))
    }
}

/// Runs the cleanup hook exactly once: awaited on the normal path,
/// spawned onto the tracker if the run is dropped mid-flight. Holds the
/// runner's serial lock until the hook has finished.
struct CleanupGuard {
    service: String,
    hook: Option<CleanupHook>,
    tracker: TaskTracker,
    serial: Option<OwnedMutexGuard<()>>,
}

impl CleanupGuard {
    fn new(
        service: &str,
        hook: Option<CleanupHook>,
        tracker: TaskTracker,
        serial: OwnedMutexGuard<()>,
    ) -> Self {
        Self {
            service: service.to_string(),
            hook,
            tracker,
            serial: Some(serial),
        }
    }

    async fn finish(mut self) -> Option<StatusError> {
        let hook = self.hook.take()?;
        match hook().await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(service = %self.service, error = %e, "Cleanup failed");
                Some(StatusError::Cleanup(e))
            }
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let Some(hook) = self.hook.take() else {
            return;
        };
        let service = std::mem::take(&mut self.service);
        let serial = self.serial.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(service = %service, "Run aborted, releasing probe resources");
                self.tracker.spawn_on(
                    hook().map(move |result| {
                        drop(serial);
                        if let Err(e) = result {
                            tracing::error!(service = %service, error = %e, "Cleanup after abort failed");
                        }
                    }),
                    &handle,
                );
            }
            Err(_) => {
                tracing::error!(service = %service, "Run aborted outside a runtime, cleanup skipped");
            }
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
