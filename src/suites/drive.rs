//! Probes for blob storage.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::StatusResult;
use crate::platform::{BlobStore, PlatformResult};
use crate::probe::registry::{ensure, ProbeError, ProbeRegistry};
use crate::suites::ping::ping;

const ALL_NAME: &str = "test_all.txt";

/// Register the blob probes.
///
/// Put, get, list and delete run as one probe: in slow regions separate
/// probes would each pay the round-trip and push the batch past its deadline.
pub fn registry(
    store: Arc<dyn BlobStore>,
    http: reqwest::Client,
    ping_url: String,
) -> StatusResult<ProbeRegistry> {
    let mut registry = ProbeRegistry::new();
    registry.register("test_ping", move || ping(http.clone(), ping_url.clone()))?;
    registry.register("test_all", move || all(store.clone()))?;
    Ok(registry)
}

/// Delete every blob left in the scratch drive.
pub async fn cleanup(store: Arc<dyn BlobStore>) -> PlatformResult<()> {
    let names = store.list().await?;
    if !names.is_empty() {
        let deleted = store.delete_many(&names).await?;
        tracing::debug!(removed = deleted.len(), "Scratch drive cleared");
    }
    Ok(())
}

async fn all(store: Arc<dyn BlobStore>) -> Result<Value, ProbeError> {
    // Unique content so a stale blob from an earlier run cannot pass the read.
    let content = format!("testing all {:08x}", fastrand::u32(..));

    let name = store.put(ALL_NAME, content.clone().into_bytes()).await?;
    ensure(name == ALL_NAME, format!("put returned name '{}'", name))?;

    let read = store.get(ALL_NAME).await?;
    ensure(
        read.as_deref() == Some(content.as_bytes()),
        "downloaded content differs from upload",
    )?;

    let names = store.list().await?;
    ensure(
        names.iter().any(|n| n == ALL_NAME),
        "uploaded file missing from listing",
    )?;

    let deleted = store.delete(ALL_NAME).await?;
    ensure(deleted == ALL_NAME, format!("delete returned name '{}'", deleted))?;

    Ok(json!({"bytes": content.len()}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryDrive;

    #[tokio::test]
    async fn test_all_passes_and_leaves_nothing() {
        let memory = MemoryDrive::new();
        let store: Arc<dyn BlobStore> = Arc::new(memory.clone());
        all(store).await.unwrap();
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_removes_leftovers() {
        let memory = MemoryDrive::new();
        let store: Arc<dyn BlobStore> = Arc::new(memory.clone());
        store.put("b/c", b"left".to_vec()).await.unwrap();
        store.put("x.txt", b"over".to_vec()).await.unwrap();

        cleanup(store).await.unwrap();
        assert!(memory.is_empty());
    }
}
