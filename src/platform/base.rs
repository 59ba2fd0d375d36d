//! Key-value collection over the platform REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::platform::client::{check_status, is_not_found, PlatformClient};
use crate::platform::{
    item_key, Item, KeyValueStore, PlatformError, PlatformResult, Query, EXPIRES_FIELD,
};

/// Items per `PUT /items` request accepted by the API.
const PUT_BATCH: usize = 25;

#[derive(Deserialize)]
struct PutResponse {
    processed: Processed,
}

#[derive(Deserialize, Default)]
struct Processed {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct QueryResponse {
    paging: Paging,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct Paging {
    #[serde(default)]
    last: Option<String>,
}

/// One remote key-value collection.
pub struct RemoteBase {
    client: PlatformClient,
    url: String,
}

impl RemoteBase {
    pub fn new(client: PlatformClient, name: &str) -> Self {
        let url = client.base_url(name);
        Self { client, url }
    }

    async fn put_batch(&self, items: Vec<Item>) -> PlatformResult<Vec<Item>> {
        let response = self
            .client
            .put(&format!("{}/items", self.url))
            .json(&json!({ "items": items }))
            .send()
            .await?;
        let body: PutResponse = check_status(response).await?.json().await?;
        Ok(body.processed.items)
    }
}

pub(crate) fn with_expiry(mut item: Item, expire_in: Option<Duration>, now: u64) -> Item {
    if let Some(ttl) = expire_in {
        item.insert(EXPIRES_FIELD.to_string(), json!(now + ttl.as_secs()));
    }
    item
}

#[async_trait]
impl KeyValueStore for RemoteBase {
    async fn put(&self, item: Item, expire_in: Option<Duration>) -> PlatformResult<Item> {
        let item = with_expiry(item, expire_in, crate::probe::runner::unix_now());
        self.put_batch(vec![item])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::Status {
                status: 207,
                body: "item not processed".to_string(),
            })
    }

    async fn put_many(&self, items: Vec<Item>) -> PlatformResult<Vec<Item>> {
        let mut stored = Vec::with_capacity(items.len());
        for chunk in items.chunks(PUT_BATCH) {
            stored.extend(self.put_batch(chunk.to_vec()).await?);
        }
        Ok(stored)
    }

    async fn insert(&self, item: Item) -> PlatformResult<Item> {
        let key = item_key(&item)?.to_string();
        let response = self
            .client
            .post(&format!("{}/items", self.url))
            .json(&json!({ "item": item }))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(PlatformError::Conflict(key));
        }
        Ok(check_status(response).await?.json().await?)
    }

    async fn get(&self, key: &str) -> PlatformResult<Option<Item>> {
        let response = self
            .client
            .get(&format!("{}/items/{}", self.url, key))
            .send()
            .await?;
        if is_not_found(&response) {
            return Ok(None);
        }
        Ok(Some(check_status(response).await?.json().await?))
    }

    async fn delete(&self, key: &str) -> PlatformResult<()> {
        let response = self
            .client
            .delete(&format!("{}/items/{}", self.url, key))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn update(&self, key: &str, set: Item) -> PlatformResult<()> {
        let response = self
            .client
            .patch(&format!("{}/items/{}", self.url, key))
            .json(&json!({ "set": set }))
            .send()
            .await?;
        if is_not_found(&response) {
            return Err(PlatformError::NotFound(key.to_string()));
        }
        check_status(response).await?;
        Ok(())
    }

    async fn fetch(&self, query: &Query) -> PlatformResult<Vec<Item>> {
        let mut items = Vec::new();
        let mut last: Option<String> = None;

        loop {
            let mut body = json!({ "query": query.to_wire() });
            if let Some(cursor) = &last {
                body["last"] = Value::String(cursor.clone());
            }
            let response = self
                .client
                .post(&format!("{}/query", self.url))
                .json(&body)
                .send()
                .await?;
            let page: QueryResponse = check_status(response).await?.json().await?;
            items.extend(page.items);

            match page.paging.last {
                Some(cursor) if !cursor.is_empty() => last = Some(cursor),
                _ => break,
            }
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{serve, PROJECT_KEY};
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post, put},
        Json, Router,
    };
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<Value>>>;

    async fn base(router: Router) -> RemoteBase {
        RemoteBase::new(serve(router).await, "c")
    }

    fn item(key: &str) -> Item {
        json!({"key": key, "content": "x"}).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_fetch_follows_paging() {
        let seen: Seen = Arc::default();
        let log = seen.clone();
        let router = Router::new().route(
            "/proj/c/query",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let log = log.clone();
                async move {
                    let api_key = headers
                        .get("x-api-key")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    log.lock().unwrap().push(json!({"api_key": api_key, "body": body.clone()}));
                    match body.get("last") {
                        None => Json(json!({
                            "paging": {"size": 2, "last": "k2"},
                            "items": [{"key": "k1"}, {"key": "k2"}]
                        })),
                        Some(_) => Json(json!({"paging": {"size": 1}, "items": [{"key": "k3"}]})),
                    }
                }
            }),
        );
        let base = base(router).await;

        let items = base.fetch(&Query::all().eq("service", "base")).await.unwrap();
        let keys: Vec<_> = items.iter().map(|i| i["key"].as_str().unwrap()).collect();
        assert_eq!(keys, vec!["k1", "k2", "k3"]);

        let requests = seen.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["api_key"], PROJECT_KEY);
        assert_eq!(requests[0]["body"]["query"], json!([{"service": "base"}]));
        assert_eq!(requests[1]["body"]["last"], "k2");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let router = Router::new()
            .route("/proj/c/items", post(|| async { StatusCode::CONFLICT }))
            .route(
                "/proj/c/items/{key}",
                get(|Path(key): Path<String>| async move {
                    if key == "missing" {
                        StatusCode::NOT_FOUND.into_response()
                    } else {
                        Json(json!({"key": key})).into_response()
                    }
                })
                .patch(|| async { StatusCode::NOT_FOUND })
                .delete(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let base = base(router).await;

        assert!(matches!(
            base.insert(item("a")).await,
            Err(PlatformError::Conflict(ref key)) if key == "a"
        ));
        assert!(base.get("missing").await.unwrap().is_none());
        assert_eq!(base.get("a").await.unwrap().unwrap()["key"], "a");
        assert!(matches!(
            base.update("a", item("a")).await,
            Err(PlatformError::NotFound(_))
        ));
        assert!(matches!(
            base.delete("a").await,
            Err(PlatformError::Status { status: 500, ref body }) if body == "boom"
        ));
    }

    #[tokio::test]
    async fn test_put_many_batches() {
        let seen: Seen = Arc::default();
        let log = seen.clone();
        let router = Router::new().route(
            "/proj/c/items",
            put(move |Json(body): Json<Value>| {
                let log = log.clone();
                async move {
                    log.lock().unwrap().push(body.clone());
                    Json(json!({"processed": {"items": body["items"]}}))
                }
            }),
        );
        let base = base(router).await;

        let items: Vec<Item> = (0..60).map(|i| item(&format!("k{}", i))).collect();
        assert_eq!(base.put_many(items).await.unwrap().len(), 60);

        let stored = base
            .put(item("ttl"), Some(Duration::from_secs(60)))
            .await
            .unwrap();
        assert!(stored.contains_key(EXPIRES_FIELD));

        let sizes: Vec<_> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|b| b["items"].as_array().map_or(0, Vec::len))
            .collect();
        assert_eq!(sizes, vec![25, 25, 10, 1]);
    }

    #[test]
    fn test_expiry_attribute() {
        let item = json!({"key": "a"}).as_object().cloned().unwrap();
        let stamped = with_expiry(item.clone(), Some(Duration::from_secs(60)), 1_000);
        assert_eq!(stamped[EXPIRES_FIELD], json!(1_060));

        let untouched = with_expiry(item, None, 1_000);
        assert!(!untouched.contains_key(EXPIRES_FIELD));
    }
}
