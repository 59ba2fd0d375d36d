use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::presented_credential;
use crate::error::{StatusError, StatusResult};
use crate::http::server::AppState;
use crate::probe::{RunReport, RunResult, Service};
use crate::recorder::{ReadQuery, SummaryRecord};

/// One completed run as returned to callers.
#[derive(Debug, Serialize)]
pub struct RunView {
    #[serde(flatten)]
    pub report: RunReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_error: Option<String>,
}

impl From<RunResult> for RunView {
    fn from(result: RunResult) -> Self {
        Self {
            report: result.report,
            key: result.recorded,
            persistence_error: result.persistence_error.map(|e| e.to_string()),
            cleanup_error: result.cleanup_error.map(|e| e.to_string()),
        }
    }
}

/// Per-service entry of a full sweep.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ServiceRun {
    Completed(RunView),
    Failed { error: String },
}

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "region": state.region.as_ref(),
    }))
}

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn services(State(state): State<AppState>) -> Json<Vec<Service>> {
    Json(state.monitor.services())
}

pub async fn results(
    State(state): State<AppState>,
    Query(query): Query<ReadQuery>,
) -> StatusResult<Json<Vec<RunReport>>> {
    Ok(Json(state.recorder.runs(&query).await?))
}

pub async fn summaries(
    State(state): State<AppState>,
    Query(query): Query<ReadQuery>,
) -> StatusResult<Json<Vec<SummaryRecord>>> {
    Ok(Json(state.recorder.summaries(&query).await?))
}

/// Store a report produced elsewhere (e.g. another region's deployment).
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(report): Json<RunReport>,
) -> StatusResult<(StatusCode, Json<Value>)> {
    report.service.parse::<Service>()?;
    let key = state
        .recorder
        .submit(&state.api_key, presented_credential(&headers), &report)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "key": key }))))
}

pub async fn run_all(State(state): State<AppState>) -> Json<BTreeMap<String, ServiceRun>> {
    let runs = state
        .monitor
        .run_all()
        .await
        .into_iter()
        .map(|(service, result)| {
            let entry = match result {
                Ok(run) => ServiceRun::Completed(run.into()),
                Err(e) => ServiceRun::Failed {
                    error: e.to_string(),
                },
            };
            (service.to_string(), entry)
        })
        .collect();
    Json(runs)
}

pub async fn run_one(
    State(state): State<AppState>,
    Path(service): Path<String>,
) -> Result<Json<RunView>, StatusError> {
    let result = state.monitor.run_named(&service).await?;
    Ok(Json(result.into()))
}
