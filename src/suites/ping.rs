//! Reachability probe shared by every suite.

use std::time::Instant;

use serde_json::{json, Value};

use crate::probe::registry::{ensure, ProbeError};

/// GET `url` and report how long the response took.
///
/// Any response short of a server error counts as reachable.
pub async fn ping(http: reqwest::Client, url: String) -> Result<Value, ProbeError> {
    let start = Instant::now();
    let response = http
        .get(&url)
        .header(reqwest::header::USER_AGENT, "status-checker-probe")
        .send()
        .await?;
    let response_time = start.elapsed().as_secs_f64();
    let status = response.status();

    ensure(
        !status.is_server_error(),
        format!("{} answered {}", url, status),
    )?;

    Ok(json!({
        "response_time": response_time,
        "status": status.as_u16(),
    }))
}
