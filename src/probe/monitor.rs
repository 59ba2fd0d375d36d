//! Service dispatch: one runner per monitored service.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio_util::task::TaskTracker;

use crate::config::StatusConfig;
use crate::error::{StatusError, StatusResult};
use crate::probe::runner::{BatchRunner, RunResult};
use crate::probe::service::Service;
use crate::recorder::ResultRecorder;
use crate::suites::{build_runner, SuiteContext};

/// Enum-indexed set of runners, built once at startup.
#[derive(Default)]
pub struct Monitor {
    runners: BTreeMap<Service, Arc<BatchRunner>>,
    cleanup: TaskTracker,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build runners for every known service from configuration.
    pub fn from_config(
        config: &StatusConfig,
        ctx: &SuiteContext,
        recorder: Arc<ResultRecorder>,
    ) -> StatusResult<Self> {
        let mut monitor = Self::new();
        for service in Service::ALL {
            let runner = build_runner(service, ctx, &config.runner, Some(recorder.clone()))?;
            monitor.insert(service, runner);
        }
        Ok(monitor)
    }

    pub fn insert(&mut self, service: Service, runner: BatchRunner) {
        let runner = runner.with_tracker(self.cleanup.clone());
        self.runners.insert(service, Arc::new(runner));
    }

    /// Wait for cleanup left behind by abandoned runs. Call once, at shutdown.
    pub async fn wait_for_cleanup(&self) {
        self.cleanup.close();
        if !self.cleanup.is_empty() {
            tracing::info!(pending = self.cleanup.len(), "Waiting for abandoned runs to clean up");
        }
        self.cleanup.wait().await;
    }

    pub fn services(&self) -> Vec<Service> {
        self.runners.keys().copied().collect()
    }

    /// Run one service's batch now.
    pub async fn run(&self, service: Service) -> StatusResult<RunResult> {
        let runner = self
            .runners
            .get(&service)
            .ok_or_else(|| StatusError::NotFound(format!("no runner for '{}'", service)))?;
        runner.run().await
    }

    /// Resolve a name first; unknown names fail before any probe starts.
    pub async fn run_named(&self, name: &str) -> StatusResult<RunResult> {
        let service: Service = name.parse()?;
        self.run(service).await
    }

    /// Run several services concurrently, in-process.
    pub async fn run_many(&self, services: &[Service]) -> Vec<(Service, StatusResult<RunResult>)> {
        join_all(services.iter().map(|&service| async move {
            (service, self.run(service).await)
        }))
        .await
    }

    /// Run every registered service.
    pub async fn run_all(&self) -> Vec<(Service, StatusResult<RunResult>)> {
        let services = self.services();
        self.run_many(&services).await
    }
}
