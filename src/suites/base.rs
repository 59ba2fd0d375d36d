//! Probes for the key-value store.
//!
//! Every probe writes under its own key so the suite can run concurrently
//! against one scratch collection.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::StatusResult;
use crate::platform::{Item, KeyValueStore, PlatformResult, Query};
use crate::probe::registry::{ensure, ProbeError, ProbeRegistry};
use crate::suites::ping::ping;

fn item(value: Value) -> Item {
    match value {
        Value::Object(map) => map,
        _ => Item::new(),
    }
}

/// Register the key-value probes.
pub fn registry(
    store: Arc<dyn KeyValueStore>,
    http: reqwest::Client,
    ping_url: String,
) -> StatusResult<ProbeRegistry> {
    let mut registry = ProbeRegistry::new();

    registry.register("test_ping", move || ping(http.clone(), ping_url.clone()))?;

    let s = store.clone();
    registry.register("test_put", move || put(s.clone()))?;
    let s = store.clone();
    registry.register("test_insert", move || insert(s.clone()))?;
    let s = store.clone();
    registry.register("test_get", move || get(s.clone()))?;
    let s = store.clone();
    registry.register("test_delete", move || delete(s.clone()))?;
    let s = store.clone();
    registry.register("test_fetch", move || fetch(s.clone()))?;
    let s = store;
    registry.register("test_update", move || update(s.clone()))?;

    Ok(registry)
}

/// Remove everything the probes left in the scratch collection.
pub async fn cleanup(store: Arc<dyn KeyValueStore>) -> PlatformResult<()> {
    let items = store.fetch(&Query::all()).await?;
    let count = items.len();
    for item in items {
        if let Some(key) = item.get("key").and_then(Value::as_str) {
            store.delete(key).await?;
        }
    }
    tracing::debug!(removed = count, "Scratch collection cleared");
    Ok(())
}

async fn put(store: Arc<dyn KeyValueStore>) -> Result<Value, ProbeError> {
    let expected = item(json!({"key": "test_put", "content": "testing put"}));
    let stored = store.put(expected.clone(), None).await?;
    ensure(stored == expected, "put returned a different item")?;
    Ok(Value::Null)
}

async fn insert(store: Arc<dyn KeyValueStore>) -> Result<Value, ProbeError> {
    let expected = item(json!({"key": "test_insert", "content": "testing insert"}));
    let stored = store.insert(expected.clone()).await?;
    ensure(stored == expected, "insert returned a different item")?;
    Ok(Value::Null)
}

async fn get(store: Arc<dyn KeyValueStore>) -> Result<Value, ProbeError> {
    let expected = item(json!({"key": "test_get", "content": "testing get"}));
    store.put(expected.clone(), None).await?;
    let fetched = store.get("test_get").await?;
    ensure(fetched.as_ref() == Some(&expected), "get did not return the stored item")?;
    Ok(Value::Null)
}

async fn delete(store: Arc<dyn KeyValueStore>) -> Result<Value, ProbeError> {
    let doomed = item(json!({"key": "test_delete", "content": "testing delete"}));
    store.put(doomed, None).await?;
    store.delete("test_delete").await?;
    ensure(
        store.get("test_delete").await?.is_none(),
        "item still present after delete",
    )?;
    Ok(Value::Null)
}

async fn fetch(store: Arc<dyn KeyValueStore>) -> Result<Value, ProbeError> {
    let expected = vec![
        item(json!({"key": "test_fetch", "content": "testing fetch"})),
        item(json!({"key": "test_fetch2", "content": "also testing fetch"})),
    ];
    store.put_many(expected.clone()).await?;

    let mut found = store
        .fetch(&Query::all().contains("content", "fetch"))
        .await?;
    found.sort_by(|a, b| {
        let ka = a.get("key").and_then(Value::as_str).unwrap_or_default();
        let kb = b.get("key").and_then(Value::as_str).unwrap_or_default();
        ka.cmp(kb)
    });

    ensure(
        found == expected,
        format!("fetch returned {} items, expected the 2 stored", found.len()),
    )?;
    Ok(json!({"count": found.len()}))
}

async fn update(store: Arc<dyn KeyValueStore>) -> Result<Value, ProbeError> {
    store
        .put(item(json!({"key": "test_update", "content": "testing update"})), None)
        .await?;
    store
        .update(
            "test_update",
            item(json!({"content": "testing update (updated)"})),
        )
        .await?;

    let expected = item(json!({"key": "test_update", "content": "testing update (updated)"}));
    let fetched = store.get("test_update").await?;
    ensure(fetched.as_ref() == Some(&expected), "update was not applied")?;
    Ok(Value::Null)
}
