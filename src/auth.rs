//! Shared-secret credential checks.

use crate::error::{StatusError, StatusResult};

/// The configured write/trigger secret.
#[derive(Clone)]
pub struct ApiKey {
    secret: String,
}

impl ApiKey {
    pub fn new(secret: impl Into<String>) -> StatusResult<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(StatusError::Configuration("no API key provided".to_string()));
        }
        Ok(Self { secret })
    }

    /// Accept only an exact match; absent credentials are rejected.
    pub fn verify(&self, presented: Option<&str>) -> StatusResult<()> {
        match presented {
            Some(candidate) if constant_time_eq(candidate.as_bytes(), self.secret.as_bytes()) => {
                Ok(())
            }
            _ => Err(StatusError::Authorization),
        }
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(..)")
    }
}

/// Pull the credential out of `Authorization: Bearer ..` or `X-API-Key`.
pub fn presented_credential(headers: &axum::http::HeaderMap) -> Option<&str> {
    if let Some(bearer) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(bearer.trim());
    }
    headers.get("X-API-Key").and_then(|h| h.to_str().ok())
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_verify() {
        let key = ApiKey::new("s3cret").unwrap();
        assert!(key.verify(Some("s3cret")).is_ok());
        assert!(matches!(key.verify(Some("s3creT")), Err(StatusError::Authorization)));
        assert!(matches!(key.verify(Some("s3cret2")), Err(StatusError::Authorization)));
        assert!(matches!(key.verify(None), Err(StatusError::Authorization)));
    }

    #[test]
    fn test_empty_secret_is_configuration_error() {
        assert!(matches!(ApiKey::new(""), Err(StatusError::Configuration(_))));
    }

    #[test]
    fn test_credential_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(presented_credential(&headers), None);

        headers.insert("X-API-Key", HeaderValue::from_static("k1"));
        assert_eq!(presented_credential(&headers), Some("k1"));

        headers.insert("Authorization", HeaderValue::from_static("Bearer k2"));
        assert_eq!(presented_credential(&headers), Some("k2"));
    }
}
