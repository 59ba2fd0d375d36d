//! In-process stores with the same semantics as the remote ones.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::platform::base::with_expiry;
use crate::platform::{
    item_key, BlobStore, Item, KeyValueStore, PlatformError, PlatformResult, Query,
    EXPIRES_FIELD, KEY_FIELD,
};
use crate::probe::runner::unix_now;

/// A thread-safe key-value collection.
#[derive(Clone, Default)]
pub struct MemoryBase {
    inner: Arc<DashMap<String, Item>>,
}

impl MemoryBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop every item whose expiry has passed.
    pub fn purge_expired(&self) -> usize {
        let now = unix_now();
        let before = self.inner.len();
        self.inner.retain(|_, item| !is_expired(item, now));
        before - self.inner.len()
    }

    fn live(&self, key: &str) -> Option<Item> {
        let item = self.inner.get(key)?.value().clone();
        (!is_expired(&item, unix_now())).then_some(item)
    }
}

fn is_expired(item: &Item, now: u64) -> bool {
    item.get(EXPIRES_FIELD)
        .and_then(Value::as_u64)
        .is_some_and(|expires| expires <= now)
}

fn keyed(mut item: Item) -> Item {
    if !item.contains_key(KEY_FIELD) {
        let key = format!("{:016x}", fastrand::u64(..));
        item.insert(KEY_FIELD.to_string(), Value::String(key));
    }
    item
}

#[async_trait]
impl KeyValueStore for MemoryBase {
    async fn put(&self, item: Item, expire_in: Option<Duration>) -> PlatformResult<Item> {
        let item = with_expiry(keyed(item), expire_in, unix_now());
        let key = item_key(&item)?.to_string();
        self.inner.insert(key, item.clone());
        Ok(item)
    }

    async fn put_many(&self, items: Vec<Item>) -> PlatformResult<Vec<Item>> {
        let mut stored = Vec::with_capacity(items.len());
        for item in items {
            stored.push(self.put(item, None).await?);
        }
        Ok(stored)
    }

    async fn insert(&self, item: Item) -> PlatformResult<Item> {
        let item = keyed(item);
        let key = item_key(&item)?.to_string();
        if self.live(&key).is_some() {
            return Err(PlatformError::Conflict(key));
        }
        self.inner.insert(key, item.clone());
        Ok(item)
    }

    async fn get(&self, key: &str) -> PlatformResult<Option<Item>> {
        Ok(self.live(key))
    }

    async fn delete(&self, key: &str) -> PlatformResult<()> {
        self.inner.remove(key);
        Ok(())
    }

    async fn update(&self, key: &str, set: Item) -> PlatformResult<()> {
        if self.live(key).is_none() {
            return Err(PlatformError::NotFound(key.to_string()));
        }
        let mut entry = self
            .inner
            .get_mut(key)
            .ok_or_else(|| PlatformError::NotFound(key.to_string()))?;
        for (field, value) in set {
            if field != KEY_FIELD {
                entry.insert(field, value);
            }
        }
        Ok(())
    }

    async fn fetch(&self, query: &Query) -> PlatformResult<Vec<Item>> {
        let now = unix_now();
        let mut items: Vec<Item> = self
            .inner
            .iter()
            .map(|r| r.value().clone())
            .filter(|item| !is_expired(item, now) && query.matches(item))
            .collect();
        items.sort_by(|a, b| {
            let ka = a.get(KEY_FIELD).and_then(Value::as_str).unwrap_or_default();
            let kb = b.get(KEY_FIELD).and_then(Value::as_str).unwrap_or_default();
            ka.cmp(kb)
        });
        Ok(items)
    }
}

/// A thread-safe blob drive.
#[derive(Clone, Default)]
pub struct MemoryDrive {
    inner: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryDrive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryDrive {
    async fn put(&self, name: &str, data: Vec<u8>) -> PlatformResult<String> {
        self.inner.insert(name.to_string(), data);
        Ok(name.to_string())
    }

    async fn get(&self, name: &str) -> PlatformResult<Option<Vec<u8>>> {
        Ok(self.inner.get(name).map(|r| r.value().clone()))
    }

    async fn list(&self) -> PlatformResult<Vec<String>> {
        let mut names: Vec<String> = self.inner.iter().map(|r| r.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> PlatformResult<String> {
        self.inner.remove(name);
        Ok(name.to_string())
    }

    async fn delete_many(&self, names: &[String]) -> PlatformResult<Vec<String>> {
        Ok(names
            .iter()
            .filter(|name| self.inner.remove(name.as_str()).is_some())
            .cloned()
            .collect())
    }
}

/// Named memory stores; the same name always yields the same store.
#[derive(Clone, Default)]
pub struct MemoryPlatform {
    bases: Arc<DashMap<String, MemoryBase>>,
    drives: Arc<DashMap<String, MemoryDrive>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory_base(&self, name: &str) -> MemoryBase {
        self.bases.entry(name.to_string()).or_default().clone()
    }

    pub fn memory_drive(&self, name: &str) -> MemoryDrive {
        self.drives.entry(name.to_string()).or_default().clone()
    }

    pub fn base(&self, name: &str) -> Arc<dyn KeyValueStore> {
        Arc::new(self.memory_base(name))
    }

    pub fn drive(&self, name: &str) -> Arc<dyn BlobStore> {
        Arc::new(self.memory_drive(name))
    }
}
