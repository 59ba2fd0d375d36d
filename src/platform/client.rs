//! Shared HTTP client for the platform REST API.
//!
//! # Responsibilities
//! - Derive the project id from the project key
//! - Build collection/drive URLs
//! - Attach the `X-API-Key` header and map error statuses

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};

use crate::config::PlatformConfig;
use crate::platform::{PlatformError, PlatformResult};

const API_KEY_HEADER: &str = "X-API-Key";

/// Authenticated REST client, cheap to clone.
#[derive(Clone)]
pub struct PlatformClient {
    http: reqwest::Client,
    project_key: String,
    project_id: String,
    base_host: String,
    drive_host: String,
}

impl PlatformClient {
    pub fn new(config: &PlatformConfig, timeout: Duration) -> PlatformResult<Self> {
        let project_id = project_id(&config.project_key)?.to_string();
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            project_key: config.project_key.clone(),
            project_id,
            base_host: config.base_host.trim_end_matches('/').to_string(),
            drive_host: config.drive_host.trim_end_matches('/').to_string(),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Root URL of a key-value collection.
    pub fn base_url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.base_host, self.project_id, name)
    }

    /// Root URL of a blob drive.
    pub fn drive_url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.drive_host, self.project_id, name)
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.authed(self.http.get(url))
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.authed(self.http.post(url))
    }

    pub fn put(&self, url: &str) -> RequestBuilder {
        self.authed(self.http.put(url))
    }

    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.authed(self.http.patch(url))
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.authed(self.http.delete(url))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, &self.project_key)
    }
}

/// The project id is the part of the key before the first underscore.
pub fn project_id(project_key: &str) -> PlatformResult<&str> {
    match project_key.split_once('_') {
        Some((id, secret)) if !id.is_empty() && !secret.is_empty() => Ok(id),
        _ => Err(PlatformError::InvalidProjectKey),
    }
}

/// Turn a non-success response into [`PlatformError::Status`].
pub async fn check_status(response: Response) -> PlatformResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PlatformError::Status {
        status: status.as_u16(),
        body,
    })
}

pub fn is_not_found(response: &Response) -> bool {
    response.status() == StatusCode::NOT_FOUND
}
