//! Periodic trigger.
//!
//! # Responsibilities
//! - Sweep the configured services on a fixed interval
//! - Stop promptly on shutdown, abandoning an in-flight sweep
//!
//! # Design Decisions
//! - In-process dispatch to the monitor; no HTTP calls back into ourselves
//! - A missed tick is skipped, not queued
//! - An abandoned sweep persists nothing; runner guards release probe data
//!   and the caller drains that cleanup through [`Monitor::wait_for_cleanup`]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::SchedulerConfig;
use crate::probe::{Monitor, Service};

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

pub struct Scheduler {
    monitor: Arc<Monitor>,
    config: SchedulerConfig,
    services: Vec<Service>,
}

impl Scheduler {
    pub fn new(monitor: Arc<Monitor>, config: SchedulerConfig) -> Self {
        let services = config.resolved_services();
        Self {
            monitor,
            config,
            services,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Scheduled runs disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            services = ?self.services,
            "Scheduler starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.sweep() => {}
                        _ = shutdown.recv() => {
                            tracing::info!("Scheduler received shutdown signal mid-sweep, exiting loop");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run every scheduled service once.
    pub async fn sweep(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();

        for (service, result) in self.monitor.run_many(&self.services).await {
            match result {
                Ok(run) if run.report.passed => summary.passed += 1,
                Ok(run) => {
                    tracing::warn!(
                        service = %service,
                        failed = ?run.report.failures().map(|o| o.name.as_str()).collect::<Vec<_>>(),
                        "Scheduled run found failures"
                    );
                    summary.failed += 1;
                }
                Err(e) => {
                    tracing::error!(service = %service, error = %e, "Scheduled run did not complete");
                    summary.errored += 1;
                }
            }
        }

        tracing::info!(
            passed = summary.passed,
            failed = summary.failed,
            errored = summary.errored,
            "Sweep complete"
        );
        summary
    }
}
