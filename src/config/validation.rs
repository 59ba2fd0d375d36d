//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required identifying parameters present (region, credentials)
//! - Validate value ranges (timeouts and TTLs > 0)
//! - URLs and service names resolvable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StatusConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{PlatformMode, StatusConfig};
use crate::probe::service::Service;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Missing(&'static str),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("platform.project_key must look like <project_id>_<secret>")]
    MalformedProjectKey,

    #[error("scheduler.services names an unknown service: {0}")]
    UnknownService(String),

    #[error(
        "listener.request_timeout_secs ({request}) must exceed runner.batch_timeout_secs ({batch})"
    )]
    TimeoutOrder { request: u64, batch: u64 },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &StatusConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::NotPositive("listener.request_timeout_secs"));
    }

    if config.runner.region.trim().is_empty() {
        errors.push(ValidationError::Missing("runner.region"));
    }
    if config.runner.batch_timeout_secs == 0 {
        errors.push(ValidationError::NotPositive("runner.batch_timeout_secs"));
    }
    if config.runner.probe_timeout_secs == 0 {
        errors.push(ValidationError::NotPositive("runner.probe_timeout_secs"));
    }
    // A triggered run must be able to finish, persist and clean up inside one request.
    let (request, batch) = (
        config.listener.request_timeout_secs,
        config.runner.batch_timeout_secs,
    );
    if request > 0 && batch > 0 && request <= batch {
        errors.push(ValidationError::TimeoutOrder { request, batch });
    }

    if config.auth.api_key.is_empty() {
        errors.push(ValidationError::Missing("auth.api_key"));
    }

    let platform = &config.platform;
    if platform.mode == PlatformMode::Remote {
        if platform.project_key.is_empty() {
            errors.push(ValidationError::Missing("platform.project_key"));
        } else if !platform
            .project_key
            .split_once('_')
            .is_some_and(|(id, secret)| !id.is_empty() && !secret.is_empty())
        {
            errors.push(ValidationError::MalformedProjectKey);
        }
        for (field, value) in [
            ("platform.base_host", &platform.base_host),
            ("platform.drive_host", &platform.drive_host),
        ] {
            check_url(field, value, &mut errors);
        }
    }
    for (field, value) in [
        ("platform.base_ping_url", &platform.base_ping_url),
        ("platform.drive_ping_url", &platform.drive_ping_url),
        ("platform.micro_ping_url", &platform.micro_ping_url),
    ] {
        check_url(field, value, &mut errors);
    }
    if platform.test_base.is_empty() {
        errors.push(ValidationError::Missing("platform.test_base"));
    }
    if platform.test_drive.is_empty() {
        errors.push(ValidationError::Missing("platform.test_drive"));
    }

    let recorder = &config.recorder;
    if recorder.runs_collection.is_empty() {
        errors.push(ValidationError::Missing("recorder.runs_collection"));
    }
    if recorder.summaries_collection.is_empty() {
        errors.push(ValidationError::Missing("recorder.summaries_collection"));
    }
    if recorder.run_ttl_secs == 0 {
        errors.push(ValidationError::NotPositive("recorder.run_ttl_secs"));
    }
    if recorder.summary_ttl_secs == 0 {
        errors.push(ValidationError::NotPositive("recorder.summary_ttl_secs"));
    }

    if config.scheduler.enabled && config.scheduler.interval_secs == 0 {
        errors.push(ValidationError::NotPositive("scheduler.interval_secs"));
    }
    for name in &config.scheduler.services {
        if name.parse::<Service>().is_err() {
            errors.push(ValidationError::UnknownService(name.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if url::Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}
