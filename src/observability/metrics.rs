//! Metrics emitted through the `metrics` facade.
//!
//! # Metrics
//! - `rest_requests_total{host,outcome}` (counter): attempts by host and outcome
//! - `rest_request_duration_seconds{host}` (histogram): per-attempt latency
//! - `rest_fallback_retries_total` (counter): attempts moved to another host
//! - `rest_fallback_records_stored_total` (counter): fallback host preferences stored
//! - `rest_connectivity_checks_total{result}` (counter): probe results
//!
//! # Design Decisions
//! - The library installs no recorder; the embedding application picks one
//! - Without a recorder every call is a no-op

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!("rest_requests_total", "REST attempts by host and outcome");
    describe_histogram!(
        "rest_request_duration_seconds",
        "Latency of a single REST attempt, including body read"
    );
    describe_counter!(
        "rest_fallback_retries_total",
        "Attempts retried on another host after a retryable failure"
    );
    describe_counter!(
        "rest_fallback_records_stored_total",
        "Times a fallback host was stored as the preferred host"
    );
    describe_counter!("rest_connectivity_checks_total", "Connectivity probe results");
}

pub fn record_request(host: &str, outcome: &str, elapsed: Duration) {
    let labels = [
        ("host", host.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!("rest_requests_total", &labels).increment(1);

    let labels = [("host", host.to_string())];
    histogram!("rest_request_duration_seconds", &labels).record(elapsed.as_secs_f64());
}

pub fn record_fallback_retry() {
    counter!("rest_fallback_retries_total").increment(1);
}

pub fn record_fallback_stored() {
    counter!("rest_fallback_records_stored_total").increment(1);
}

pub fn record_connectivity_check(up: bool) {
    let result = if up { "up" } else { "down" };
    let labels = [("result", result.to_string())];
    counter!("rest_connectivity_checks_total", &labels).increment(1);
}
