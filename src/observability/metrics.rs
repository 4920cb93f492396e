//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pipeline_requests_total` (counter): requests served, by status
//! - `pipeline_request_duration_seconds` (histogram): traversal latency
//! - `pipeline_failures_total` (counter): failures caught at the boundary, by kind
//! - `pipeline_dispatch_total` (counter): dispatch attempts, by outcome and
//!   action; unrouted attempts carry no `action` label
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which keeps unit tests free of setup

use metrics::{counter, histogram, Label};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a served request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("pipeline_requests_total", "method" => method.to_string(), "status" => status)
        .increment(1);
    histogram!("pipeline_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a failure converted by the error boundary.
pub fn record_failure(kind: &'static str) {
    counter!("pipeline_failures_total", "kind" => kind).increment(1);
}

/// Record the outcome of one dispatch attempt.
pub fn record_dispatch(action: Option<&str>, outcome: &'static str) {
    counter!("pipeline_dispatch_total", dispatch_labels(action, outcome)).increment(1);
}

fn dispatch_labels(action: Option<&str>, outcome: &'static str) -> Vec<Label> {
    let mut labels = vec![Label::new("outcome", outcome)];
    if let Some(action) = action {
        labels.push(Label::new("action", action.to_string()));
    }
    labels
}
