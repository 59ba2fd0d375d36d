//! Metrics collection and exposition.
//!
//! # Metrics
//! - `status_probe_runs_total` (counter): probe executions by service, probe, passed
//! - `status_probe_duration_seconds` (histogram): probe body latency
//! - `status_batch_runs_total` (counter): batches by service, passed
//! - `status_batch_duration_seconds` (histogram): whole-batch latency
//! - `status_persistence_failures_total` (counter): recorder write failures

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(service: &str, probe: &str, passed: bool, duration_secs: f64) {
    counter!(
        "status_probe_runs_total",
        "service" => service.to_string(),
        "probe" => probe.to_string(),
        "passed" => passed.to_string()
    )
    .increment(1);
    histogram!(
        "status_probe_duration_seconds",
        "service" => service.to_string(),
        "probe" => probe.to_string()
    )
    .record(duration_secs);
}

pub fn record_batch(service: &str, passed: bool, duration_secs: f64) {
    counter!(
        "status_batch_runs_total",
        "service" => service.to_string(),
        "passed" => passed.to_string()
    )
    .increment(1);
    histogram!("status_batch_duration_seconds", "service" => service.to_string())
        .record(duration_secs);
}

pub fn record_persistence_failure(service: &str) {
    counter!("status_persistence_failures_total", "service" => service.to_string()).increment(1);
}
