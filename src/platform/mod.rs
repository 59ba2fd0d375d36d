//! Client side of the platform under test.
//!
//! # Data Flow
//! ```text
//! probe suites / result recorder
//!     → KeyValueStore / BlobStore (trait objects)
//!     → base.rs / drive.rs (REST over reqwest, X-API-Key auth)
//!       or memory.rs (dashmap, same semantics, no network)
//! ```
//!
//! # Design Decisions
//! - Handles are cheap `Arc`s; one per collection or drive name
//! - Expiry is an item attribute (`__expires`, epoch seconds)
//! - Queries are a flat list of conditions ANDed together

pub mod base;
pub mod client;
pub mod drive;
pub mod memory;
#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{PlatformConfig, PlatformMode};

pub use base::RemoteBase;
pub use client::PlatformClient;
pub use drive::RemoteDrive;
pub use memory::{MemoryBase, MemoryDrive, MemoryPlatform};

/// Attribute holding an item's primary key.
pub const KEY_FIELD: &str = "key";

/// Attribute holding an item's expiry timestamp.
pub const EXPIRES_FIELD: &str = "__expires";

/// A stored document. Always carries a string `key` once persisted.
pub type Item = Map<String, Value>;

/// Errors raised by store handles.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("item with key '{0}' already exists")]
    Conflict(String),

    #[error("item with key '{0}' not found")]
    NotFound(String),

    #[error("delete of '{name}' refused: {reason}")]
    DeleteFailed { name: String, reason: String },

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid project key")]
    InvalidProjectKey,

    #[error("item has no string key")]
    MissingKey,
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// One condition of a fetch query.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Attribute equals the value.
    Eq(String, Value),
    /// String attribute contains the substring.
    Contains(String, String),
}

impl Condition {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Condition::Eq(field, value) => item.get(field) == Some(value),
            Condition::Contains(field, needle) => item
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.contains(needle.as_str())),
        }
    }
}

/// Conjunction of conditions; empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.into(), value.into()));
        self
    }

    pub fn contains(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::Contains(field.into(), needle.into()));
        self
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.conditions.iter().all(|c| c.matches(item))
    }

    /// Wire form: `[{"field": v, "field?contains": "s"}]`.
    pub fn to_wire(&self) -> Value {
        if self.conditions.is_empty() {
            return Value::Array(Vec::new());
        }
        let mut clause = Map::new();
        for condition in &self.conditions {
            match condition {
                Condition::Eq(field, value) => {
                    clause.insert(field.clone(), value.clone());
                }
                Condition::Contains(field, needle) => {
                    clause.insert(format!("{}?contains", field), Value::String(needle.clone()));
                }
            }
        }
        Value::Array(vec![Value::Object(clause)])
    }
}

/// Keyed document collection.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Create or overwrite an item; `expire_in` sets `__expires`.
    async fn put(&self, item: Item, expire_in: Option<Duration>) -> PlatformResult<Item>;

    async fn put_many(&self, items: Vec<Item>) -> PlatformResult<Vec<Item>>;

    /// Create an item, failing with [`PlatformError::Conflict`] if the key exists.
    async fn insert(&self, item: Item) -> PlatformResult<Item>;

    async fn get(&self, key: &str) -> PlatformResult<Option<Item>>;

    /// Remove an item. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> PlatformResult<()>;

    /// Set the given attributes on an existing item.
    async fn update(&self, key: &str, set: Item) -> PlatformResult<()>;

    /// All unexpired items matching the query.
    async fn fetch(&self, query: &Query) -> PlatformResult<Vec<Item>>;
}

/// Named blob collection.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob, returning its name.
    async fn put(&self, name: &str, data: Vec<u8>) -> PlatformResult<String>;

    async fn get(&self, name: &str) -> PlatformResult<Option<Vec<u8>>>;

    async fn list(&self) -> PlatformResult<Vec<String>>;

    /// Delete a blob, returning its name.
    async fn delete(&self, name: &str) -> PlatformResult<String>;

    /// Delete several blobs, returning the names actually deleted.
    async fn delete_many(&self, names: &[String]) -> PlatformResult<Vec<String>>;
}

/// Factory for store handles, chosen by configuration.
#[derive(Clone)]
pub enum Platform {
    Remote(PlatformClient),
    Memory(MemoryPlatform),
}

impl Platform {
    pub fn from_config(config: &PlatformConfig, timeout: Duration) -> PlatformResult<Self> {
        match config.mode {
            PlatformMode::Remote => Ok(Platform::Remote(PlatformClient::new(config, timeout)?)),
            PlatformMode::Memory => Ok(Platform::Memory(MemoryPlatform::new())),
        }
    }

    pub fn base(&self, name: &str) -> Arc<dyn KeyValueStore> {
        match self {
            Platform::Remote(client) => Arc::new(RemoteBase::new(client.clone(), name)),
            Platform::Memory(memory) => memory.base(name),
        }
    }

    pub fn drive(&self, name: &str) -> Arc<dyn BlobStore> {
        match self {
            Platform::Remote(client) => Arc::new(RemoteDrive::new(client.clone(), name)),
            Platform::Memory(memory) => memory.drive(name),
        }
    }
}

/// Read the string key of an item.
pub fn item_key(item: &Item) -> PlatformResult<&str> {
    item.get(KEY_FIELD)
        .and_then(Value::as_str)
        .ok_or(PlatformError::MissingKey)
}
