//! Probe suites, one per monitored service.
//!
//! # Data Flow
//! ```text
//! StatusConfig
//!     → SuiteContext (store handles, probe HTTP client, URLs)
//!     → build_runner(service)
//!         base.rs  → ping, put, insert, get, delete, fetch, update + clear collection
//!         drive.rs → ping, all + clear drive
//!         micro.rs → ping
//!     → BatchRunner bound to service + region, recorder attached
//! ```

pub mod base;
pub mod drive;
pub mod micro;
pub mod ping;

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;

use crate::config::{PlatformConfig, RunnerConfig};
use crate::error::{StatusError, StatusResult};
use crate::platform::Platform;
use crate::probe::runner::BatchRunner;
use crate::probe::service::Service;
use crate::recorder::ResultRecorder;

/// What a suite needs to reach the system under test.
#[derive(Clone)]
pub struct SuiteContext {
    pub platform: Platform,
    pub http: reqwest::Client,
    pub platform_config: PlatformConfig,
}

impl SuiteContext {
    pub fn new(platform: Platform, platform_config: PlatformConfig, timeout: Duration) -> StatusResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StatusError::Configuration(format!("probe HTTP client: {}", e)))?;
        Ok(Self {
            platform,
            http,
            platform_config,
        })
    }
}

/// Build the runner for one service with its probes and cleanup hook.
pub fn build_runner(
    service: Service,
    ctx: &SuiteContext,
    runner: &RunnerConfig,
    recorder: Option<Arc<ResultRecorder>>,
) -> StatusResult<BatchRunner> {
    let config = &ctx.platform_config;

    let batch = match service {
        Service::Base => {
            let store = ctx.platform.base(&config.test_base);
            let registry = base::registry(store.clone(), ctx.http.clone(), config.base_ping_url.clone())?;
            BatchRunner::new(service.as_str(), &runner.region, registry)?
                .with_cleanup(move || base::cleanup(store.clone()).boxed())
        }
        Service::Drive => {
            let store = ctx.platform.drive(&config.test_drive);
            let registry = drive::registry(store.clone(), ctx.http.clone(), config.drive_ping_url.clone())?;
            BatchRunner::new(service.as_str(), &runner.region, registry)?
                .with_cleanup(move || drive::cleanup(store.clone()).boxed())
        }
        Service::Micro => {
            let registry = micro::registry(ctx.http.clone(), config.micro_ping_url.clone())?;
            BatchRunner::new(service.as_str(), &runner.region, registry)?
        }
    };

    let batch = batch
        .with_policy(runner.policy)
        .with_batch_timeout(Duration::from_secs(runner.batch_timeout_secs));

    Ok(match recorder {
        Some(recorder) => batch.with_recorder(recorder),
        None => batch,
    })
}
