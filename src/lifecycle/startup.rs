//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated config into store handles, recorder and runners
//! - Surface any construction problem as a configuration error

use std::sync::Arc;
use std::time::Duration;

use crate::auth::ApiKey;
use crate::config::StatusConfig;
use crate::error::{StatusError, StatusResult};
use crate::platform::Platform;
use crate::probe::Monitor;
use crate::recorder::ResultRecorder;
use crate::suites::SuiteContext;

/// Fully wired application state.
#[derive(Clone)]
pub struct App {
    pub config: Arc<StatusConfig>,
    pub monitor: Arc<Monitor>,
    pub recorder: Arc<ResultRecorder>,
    pub api_key: ApiKey,
}

impl App {
    /// Build against the platform selected in the config.
    pub fn build(config: StatusConfig) -> StatusResult<Self> {
        let timeout = Duration::from_secs(config.runner.probe_timeout_secs);
        let platform = Platform::from_config(&config.platform, timeout)
            .map_err(|e| StatusError::Configuration(format!("platform client: {}", e)))?;
        Self::with_platform(config, platform)
    }

    /// Build against an explicit platform (memory stores in tests).
    pub fn with_platform(config: StatusConfig, platform: Platform) -> StatusResult<Self> {
        let api_key = ApiKey::new(config.auth.api_key.clone())?;
        let timeout = Duration::from_secs(config.runner.probe_timeout_secs);

        let recorder = Arc::new(ResultRecorder::from_config(&config.recorder, &platform));
        let ctx = SuiteContext::new(platform, config.platform.clone(), timeout)?;
        let monitor = Arc::new(Monitor::from_config(&config, &ctx, recorder.clone())?);

        tracing::info!(
            region = %config.runner.region,
            services = ?monitor.services(),
            policy = ?config.runner.policy,
            "Runners ready"
        );

        Ok(Self {
            config: Arc::new(config),
            monitor,
            recorder,
            api_key,
        })
    }
}
