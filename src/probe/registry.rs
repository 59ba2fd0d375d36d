//! Probe registry and the outcome-producing wrapper.
//!
//! # Responsibilities
//! - Associate a stable name with a zero-argument async check
//! - Reject duplicate names at construction
//! - Turn a probe body into a timed [`ProbeOutcome`], whatever it does
//!
//! # Design Decisions
//! - Registration order is iteration order
//! - Declared names may carry a `test_` prefix which is stripped
//! - Errors and panics inside a body become failed outcomes; nothing escapes

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use thiserror::Error;

use crate::error::{StatusError, StatusResult};
use crate::platform::PlatformError;
use crate::probe::outcome::{details_from, ProbeOutcome};

/// Conventional prefix on declared probe names.
pub const NAME_PREFIX: &str = "test_";

/// Failure raised inside a probe body.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Fail the probe with `message` unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), ProbeError> {
    if condition {
        Ok(())
    } else {
        Err(ProbeError::Assertion(message.into()))
    }
}

pub type ProbeFuture = BoxFuture<'static, Result<Value, ProbeError>>;

/// A no-argument check; each call starts a fresh attempt.
pub type Probe = Arc<dyn Fn() -> ProbeFuture + Send + Sync>;

/// A probe together with its reported name.
#[derive(Clone)]
pub struct RegisteredProbe {
    name: String,
    probe: Probe,
}

impl RegisteredProbe {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the probe body once and capture its outcome.
    pub async fn execute(&self) -> ProbeOutcome {
        execute(&self.name, &self.probe).await
    }
}

impl std::fmt::Debug for RegisteredProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProbe").field("name", &self.name).finish()
    }
}

/// Ordered set of uniquely named probes.
#[derive(Debug, Clone, Default)]
pub struct ProbeRegistry {
    probes: Vec<RegisteredProbe>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probe under `name` (a leading `test_` is dropped).
    pub fn register<F, Fut>(&mut self, name: &str, probe: F) -> StatusResult<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ProbeError>> + Send + 'static,
    {
        let name = probe_name(name);
        if name.is_empty() {
            return Err(StatusError::Configuration(
                "probe name must not be empty".to_string(),
            ));
        }
        if self.contains(name) {
            return Err(StatusError::Configuration(format!(
                "probe '{}' registered twice",
                name
            )));
        }

        let probe: Probe = Arc::new(move || probe().boxed());
        self.probes.push(RegisteredProbe {
            name: name.to_string(),
            probe,
        });
        Ok(())
    }

    /// Builder form of [`ProbeRegistry::register`].
    pub fn with<F, Fut>(mut self, name: &str, probe: F) -> StatusResult<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ProbeError>> + Send + 'static,
    {
        self.register(name, probe)?;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.probes.iter().any(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredProbe> {
        self.probes.iter()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

/// Strip the conventional prefix from a declared name.
pub fn probe_name(declared: &str) -> &str {
    let trimmed = declared.trim();
    trimmed.strip_prefix(NAME_PREFIX).unwrap_or(trimmed)
}

/// Time one probe body, converting any error or panic into a failed outcome.
pub async fn execute(name: &str, probe: &Probe) -> ProbeOutcome {
    let start = Instant::now();
    let result = AssertUnwindSafe(async { probe().await })
        .catch_unwind()
        .await;
    let duration = start.elapsed().as_secs_f64();

    match result {
        Ok(Ok(value)) => ProbeOutcome::success(name, duration, details_from(value)),
        Ok(Err(e)) => ProbeOutcome::failure(name, duration, e.to_string()),
        Err(panic) => ProbeOutcome::failure(
            name,
            duration,
            format!("probe panicked: {}", panic_message(panic.as_ref())),
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefix_stripped_once() {
        assert_eq!(probe_name("test_ping"), "ping");
        assert_eq!(probe_name("test_test_put"), "test_put");
        assert_eq!(probe_name("ping"), "ping");
        // A character-set strip would have eaten the leading "t" and "e".
        assert_eq!(probe_name("test_etag"), "etag");
    }

    #[test]
    fn test_duplicate_registration_is_configuration_error() {
        let mut registry = ProbeRegistry::new();
        registry.register("test_ping", || async { Ok(Value::Null) }).unwrap();
        let err = registry
            .register("ping", || async { Ok(Value::Null) })
            .unwrap_err();
        assert!(matches!(err, StatusError::Configuration(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = ProbeRegistry::new()
            .with("test_", || async { Ok(Value::Null) })
            .unwrap_err();
        assert!(matches!(err, StatusError::Configuration(_)));
    }

    #[test]
    fn test_iteration_follows_registration_order() {
        let registry = ProbeRegistry::new()
            .with("zeta", || async { Ok(Value::Null) })
            .unwrap()
            .with("alpha", || async { Ok(Value::Null) })
            .unwrap()
            .with("mid", || async { Ok(Value::Null) })
            .unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn test_execute_success_and_failure() {
        let registry = ProbeRegistry::new()
            .with("ok", || async { Ok(json!({"response_time": 0.25})) })
            .unwrap()
            .with("broken", || async {
                let stored = 2;
                ensure(stored == 3, "stored value mismatch")?;
                Ok::<_, ProbeError>(Value::Null)
            })
            .unwrap();

        let mut probes = registry.iter();
        let ok = probes.next().unwrap().execute().await;
        assert!(ok.passed);
        assert_eq!(ok.details["response_time"], json!(0.25));
        assert!(ok.duration >= 0.0);

        let broken = probes.next().unwrap().execute().await;
        assert!(!broken.passed);
        assert_eq!(broken.error(), Some("assertion failed: stored value mismatch"));
    }

    #[tokio::test]
    async fn test_execute_catches_panics() {
        let registry = ProbeRegistry::new()
            .with("explodes", || async {
                let fail = true;
                if fail {
                    panic!("boom");
                }
                Ok::<_, ProbeError>(Value::Null)
            })
            .unwrap();
        let outcome = registry.iter().next().unwrap().execute().await;
        assert!(!outcome.passed);
        assert_eq!(outcome.error(), Some("probe panicked: boom"));
    }
}
