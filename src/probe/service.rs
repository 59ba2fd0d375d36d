//! Monitored platform products.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StatusError;

/// A product of the platform that has its own probe suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// Key-value store.
    Base,
    /// Blob storage.
    Drive,
    /// Serverless app hosting (this deployment itself).
    Micro,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::Base, Service::Drive, Service::Micro];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Base => "base",
            Service::Drive => "drive",
            Service::Micro => "micro",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Service::Base),
            "drive" => Ok(Service::Drive),
            "micro" => Ok(Service::Micro),
            other => Err(StatusError::NotFound(format!("unknown service '{}'", other))),
        }
    }
}
