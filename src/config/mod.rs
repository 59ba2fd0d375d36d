//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + startup overrides (env, CLI)
//!     → loader.rs (parse, deserialize, apply overrides)
//!     → validation.rs (semantic checks)
//!     → StatusConfig (validated, immutable)
//!     → passed explicitly to constructors at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Library code never reads the environment; the binary does, once

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ConfigError, Overrides};
pub use schema::{
    AuthConfig, ExecutionPolicy, ListenerConfig, LogFormat, ObservabilityConfig, PlatformConfig,
    PlatformMode, RecorderConfig, RunnerConfig, SchedulerConfig, StatusConfig,
};
