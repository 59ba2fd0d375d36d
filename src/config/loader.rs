//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::StatusConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values that may be supplied outside the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub project_key: Option<String>,
    pub region: Option<String>,
    pub api_key: Option<String>,
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<StatusConfig, ConfigError> {
    load_config_with(path, Overrides::default())
}

/// Load configuration, apply overrides, then validate.
pub fn load_config_with(path: &Path, overrides: Overrides) -> Result<StatusConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, overrides)
}

/// Parse, override and validate configuration text.
pub fn parse_config(content: &str, overrides: Overrides) -> Result<StatusConfig, ConfigError> {
    let mut config: StatusConfig = toml::from_str(content)?;

    if let Some(key) = overrides.project_key {
        config.platform.project_key = key;
    }
    if let Some(region) = overrides.region {
        config.runner.region = region;
    }
    if let Some(api_key) = overrides.api_key {
        config.auth.api_key = api_key;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
