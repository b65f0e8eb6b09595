//! Metrics and observability utilities
//!
//! Prometheus metric descriptions and recording helpers with
//! standardized naming.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all RoastingReels metrics
pub const METRICS_PREFIX: &str = "roastingreels";

/// Buckets for outbound API latency (in seconds); the metadata client
/// gives up at 5s
pub const UPSTREAM_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_movies_created_total", METRICS_PREFIX),
        Unit::Count,
        "Movies stored, by source (api, form, sync)"
    );

    describe_counter!(
        format!("{}_reviews_created_total", METRICS_PREFIX),
        Unit::Count,
        "Reviews stored, by source (api, form)"
    );

    describe_counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Outbound API requests by service and status"
    );

    describe_histogram!(
        format!("{}_upstream_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Outbound API latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Record one outbound API call
pub fn record_upstream_call(service: &str, success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_upstream_requests_total", METRICS_PREFIX),
        "service" => service.to_string(),
        "status" => status
    )
    .increment(1);

    histogram!(
        format!("{}_upstream_duration_seconds", METRICS_PREFIX),
        "service" => service.to_string()
    )
    .record(duration_secs);
}

/// Record stored movies
pub fn record_movies_created(source: &'static str, count: usize) {
    counter!(
        format!("{}_movies_created_total", METRICS_PREFIX),
        "source" => source
    )
    .increment(count as u64);
}

/// Record a stored review
pub fn record_review_created(source: &'static str) {
    counter!(
        format!("{}_reviews_created_total", METRICS_PREFIX),
        "source" => source
    )
    .increment(1);
}
