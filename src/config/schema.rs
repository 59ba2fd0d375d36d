//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the checker.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::probe::service::Service;

/// Root configuration for the status checker.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StatusConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Batch runner settings.
    pub runner: RunnerConfig,

    /// Connection settings for the platform under test.
    pub platform: PlatformConfig,

    /// Result persistence settings.
    pub recorder: RecorderConfig,

    /// Periodic trigger settings.
    pub scheduler: SchedulerConfig,

    /// Write/trigger credential.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout for the HTTP surface in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// How probes of one batch are dispatched.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicy {
    /// All probes launched at once and joined.
    #[default]
    Concurrent,
    /// One probe at a time, in registration order (degraded mode).
    Sequential,
}

/// Batch runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Deployment/region tag attached to every report.
    pub region: String,

    /// Probe dispatch policy.
    pub policy: ExecutionPolicy,

    /// Upper bound for a whole batch in seconds.
    pub batch_timeout_secs: u64,

    /// Per-request timeout for probe HTTP clients in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            policy: ExecutionPolicy::Concurrent,
            batch_timeout_secs: 60,
            probe_timeout_secs: 20,
        }
    }
}

/// Which store implementation backs the platform handles.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlatformMode {
    /// REST API of the hosted platform.
    #[default]
    Remote,
    /// In-process stores; nothing leaves the process.
    Memory,
}

/// Platform connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub mode: PlatformMode,

    /// Project key, `<project_id>_<secret>`.
    pub project_key: String,

    /// Key-value store API root.
    pub base_host: String,

    /// Blob store API root.
    pub drive_host: String,

    /// Scratch collection written by the base probes.
    pub test_base: String,

    /// Scratch drive written by the drive probes.
    pub test_drive: String,

    pub base_ping_url: String,
    pub drive_ping_url: String,

    /// This deployment's own `/ping` route, probed by the micro suite.
    pub micro_ping_url: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            mode: PlatformMode::Remote,
            project_key: String::new(),
            base_host: "https://database.deta.sh/v1".to_string(),
            drive_host: "https://drive.deta.sh/v1".to_string(),
            test_base: "test-base".to_string(),
            test_drive: "test-drive".to_string(),
            base_ping_url: "https://database.deta.sh".to_string(),
            drive_ping_url: "https://drive.deta.sh".to_string(),
            micro_ping_url: "http://127.0.0.1:8080/ping".to_string(),
        }
    }
}

/// Result persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Collection holding full per-run reports.
    pub runs_collection: String,

    /// Collection holding flat dashboard summaries.
    pub summaries_collection: String,

    /// Lifetime of a run record in seconds.
    pub run_ttl_secs: u64,

    /// Lifetime of a summary record in seconds.
    pub summary_ttl_secs: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            runs_collection: "results".to_string(),
            summaries_collection: "summaries".to_string(),
            run_ttl_secs: 60 * 60 * 24,
            summary_ttl_secs: 60 * 60 * 24 * 90,
        }
    }
}

/// Periodic trigger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Seconds between two scheduled sweeps.
    pub interval_secs: u64,

    /// Services swept on each tick. Empty means all.
    pub services: Vec<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 600,
            services: Vec::new(),
        }
    }
}

/// Credential guarding writes and on-demand runs.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret, presented as a Bearer token or `X-API-Key`.
    pub api_key: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Services covered by each sweep, resolved against the known set.
    ///
    /// Unknown names are skipped here; validation rejects them earlier.
    pub fn resolved_services(&self) -> Vec<Service> {
        if self.services.is_empty() {
            return Service::ALL.to_vec();
        }
        self.services
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: StatusConfig = toml::from_str(
            r#"
            [runner]
            region = "eu"

            [auth]
            api_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.runner.region, "eu");
        assert_eq!(config.runner.policy, ExecutionPolicy::Concurrent);
        assert_eq!(config.recorder.run_ttl_secs, 86_400);
        assert_eq!(config.recorder.summary_ttl_secs, 7_776_000);
        assert_eq!(config.platform.test_base, "test-base");
    }

    #[test]
    fn test_policy_and_mode_parse_lowercase() {
        let config: StatusConfig = toml::from_str(
            r#"
            [runner]
            policy = "sequential"

            [platform]
            mode = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.runner.policy, ExecutionPolicy::Sequential);
        assert_eq!(config.platform.mode, PlatformMode::Memory);
    }

    #[test]
    fn test_scheduler_services_resolution() {
        let mut scheduler = SchedulerConfig::default();
        assert_eq!(scheduler.resolved_services(), Service::ALL.to_vec());

        scheduler.services = vec!["drive".into()];
        assert_eq!(scheduler.resolved_services(), vec![Service::Drive]);
    }
}
