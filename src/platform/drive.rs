//! Blob drive over the platform REST API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::platform::client::{check_status, is_not_found, PlatformClient};
use crate::platform::{BlobStore, PlatformError, PlatformResult};

#[derive(Deserialize)]
struct PutResponse {
    name: String,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    paging: Option<Paging>,
    #[serde(default)]
    names: Vec<String>,
}

#[derive(Deserialize)]
struct Paging {
    #[serde(default)]
    last: Option<String>,
}

#[derive(Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    deleted: Vec<String>,
    /// Name to reason for every file the drive refused to delete.
    #[serde(default)]
    failed: BTreeMap<String, String>,
}

/// One remote blob drive.
pub struct RemoteDrive {
    client: PlatformClient,
    url: String,
}

impl RemoteDrive {
    pub fn new(client: PlatformClient, name: &str) -> Self {
        let url = client.drive_url(name);
        Self { client, url }
    }
}

#[async_trait]
impl BlobStore for RemoteDrive {
    async fn put(&self, name: &str, data: Vec<u8>) -> PlatformResult<String> {
        let response = self
            .client
            .post(&format!("{}/files", self.url))
            .query(&[("name", name)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await?;
        let body: PutResponse = check_status(response).await?.json().await?;
        Ok(body.name)
    }

    async fn get(&self, name: &str) -> PlatformResult<Option<Vec<u8>>> {
        let response = self
            .client
            .get(&format!("{}/files/download", self.url))
            .query(&[("name", name)])
            .send()
            .await?;
        if is_not_found(&response) {
            return Ok(None);
        }
        let bytes = check_status(response).await?.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }

    async fn list(&self) -> PlatformResult<Vec<String>> {
        let mut names = Vec::new();
        let mut last: Option<String> = None;

        loop {
            let mut request = self.client.get(&format!("{}/files/list", self.url));
            if let Some(cursor) = &last {
                request = request.query(&[("last", cursor.as_str())]);
            }
            let page: ListResponse = check_status(request.send().await?).await?.json().await?;
            names.extend(page.names);

            match page.paging.and_then(|p| p.last) {
                Some(cursor) if !cursor.is_empty() => last = Some(cursor),
                _ => break,
            }
        }

        Ok(names)
    }

    async fn delete(&self, name: &str) -> PlatformResult<String> {
        let deleted = self.delete_many(&[name.to_string()]).await?;
        deleted
            .into_iter()
            .find(|n| n == name)
            .ok_or_else(|| PlatformError::DeleteFailed {
                name: name.to_string(),
                reason: "not reported as deleted".to_string(),
            })
    }

    async fn delete_many(&self, names: &[String]) -> PlatformResult<Vec<String>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .delete(&format!("{}/files", self.url))
            .json(&json!({ "names": names }))
            .send()
            .await?;
        let body: DeleteResponse = check_status(response).await?.json().await?;

        if let Some((name, reason)) = body.failed.iter().next() {
            tracing::warn!(
                refused = body.failed.len(),
                deleted = body.deleted.len(),
                "Drive refused to delete files"
            );
            return Err(PlatformError::DeleteFailed {
                name: name.clone(),
                reason: reason.clone(),
            });
        }
        Ok(body.deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::serve;
    use axum::{
        extract::Query,
        http::StatusCode,
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn drive(router: Router) -> RemoteDrive {
        RemoteDrive::new(serve(router).await, "d")
    }

    fn listing_and_delete() -> Router {
        Router::new()
            .route(
                "/proj/d/files/list",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    match params.get("last").map(String::as_str) {
                        None => Json(json!({"paging": {"size": 2, "last": "b"}, "names": ["a", "b"]})),
                        Some(_) => Json(json!({"paging": {"size": 1}, "names": ["locked"]})),
                    }
                }),
            )
            .route(
                "/proj/d/files",
                axum::routing::delete(|Json(body): Json<Value>| async move {
                    let names: Vec<String> =
                        serde_json::from_value(body["names"].clone()).unwrap_or_default();
                    let (failed, deleted): (Vec<_>, Vec<_>) =
                        names.into_iter().partition(|n| n == "locked");
                    let failed: HashMap<_, _> = failed
                        .into_iter()
                        .map(|n| (n, "internal error".to_string()))
                        .collect();
                    Json(json!({"deleted": deleted, "failed": failed}))
                }),
            )
    }

    #[tokio::test]
    async fn test_list_follows_paging() {
        let drive = drive(listing_and_delete()).await;
        assert_eq!(drive.list().await.unwrap(), vec!["a", "b", "locked"]);
    }

    #[tokio::test]
    async fn test_refused_delete_is_an_error() {
        let drive = drive(listing_and_delete()).await;

        assert_eq!(drive.delete("a").await.unwrap(), "a");

        let err = drive.delete("locked").await.unwrap_err();
        assert!(matches!(
            err,
            PlatformError::DeleteFailed { ref name, ref reason }
                if name == "locked" && reason == "internal error"
        ));

        let err = drive
            .delete_many(&["a".to_string(), "locked".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::DeleteFailed { .. }));
    }

    #[tokio::test]
    async fn test_cleanup_surfaces_refused_delete() {
        let store: Arc<dyn BlobStore> = Arc::new(drive(listing_and_delete()).await);
        assert!(crate::suites::drive::cleanup(store).await.is_err());
    }

    #[tokio::test]
    async fn test_download_missing_is_none() {
        let router = Router::new().route(
            "/proj/d/files/download",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                match params.get("name").map(String::as_str) {
                    Some("here.txt") => "content".into_response(),
                    _ => StatusCode::NOT_FOUND.into_response(),
                }
            }),
        );
        let drive = drive(router).await;

        assert_eq!(drive.get("here.txt").await.unwrap(), Some(b"content".to_vec()));
        assert_eq!(drive.get("gone.txt").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_returns_stored_name() {
        let router = Router::new().route(
            "/proj/d/files",
            axum::routing::post(
                |Query(params): Query<HashMap<String, String>>, body: axum::body::Bytes| async move {
                    let name = params.get("name").cloned().unwrap_or_default();
                    if body.is_empty() {
                        return StatusCode::BAD_REQUEST.into_response();
                    }
                    Json(json!({"name": name, "project_id": "proj"})).into_response()
                },
            ),
        );
        let drive = drive(router).await;
        assert_eq!(drive.put("x.txt", b"data".to_vec()).await.unwrap(), "x.txt");
        assert!(matches!(
            drive.put("x.txt", Vec::new()).await,
            Err(PlatformError::Status { status: 400, .. })
        ));
    }
}
