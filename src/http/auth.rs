use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::auth::presented_credential;
use crate::error::StatusError;
use crate::http::server::AppState;

/// Reject requests without the configured key before the handler runs.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusError> {
    if let Err(e) = state.api_key.verify(presented_credential(request.headers())) {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected request without valid credential"
        );
        return Err(e);
    }
    Ok(next.run(request).await)
}
