//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define route table and request metrics
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `routes_registered_total` (counter): registrations by kind
//! - `groups_created_total` (counter): groups created
//! - `hook_failures_total` (counter): rejected hook invocations by hook
//! - `http_requests_total` (counter): served requests by method, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op, so tests need no setup
//! - Histogram buckets tuned for typical web latencies

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

use crate::app::hooks::HookKind;
use crate::app::stack::RouteKindTag;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    let builder = match builder.set_buckets_for_metric(
        Matcher::Full("http_request_duration_seconds".to_string()),
        LATENCY_BUCKETS,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::error!(error = %e, "Invalid histogram buckets");
            return;
        }
    };

    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route_registered(kind: RouteKindTag) {
    counter!("routes_registered_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_group_created() {
    counter!("groups_created_total").increment(1);
}

pub fn record_hook_failure(hook: HookKind) {
    counter!("hook_failures_total", "hook" => hook.as_str()).increment(1);
}

/// Record a served request and its latency measured from `start`.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("http_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}
