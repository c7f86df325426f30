use std::time::Duration;

use axum::http::{Method, StatusCode};
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram, IntCounter,
    IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "json_mock_requests_total",
        "Collection requests handled, by method and status",
        &["method", "status"]
    )
    .expect("register requests_total")
});

pub static REQUEST_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "json_mock_request_duration_seconds",
        "Collection request duration in seconds",
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("register request_duration")
});

pub static PERSIST_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "json_mock_persist_failures_total",
        "Mutations applied in memory whose database write failed"
    )
    .expect("register persist_failures_total")
});

pub fn record_request(method: &Method, status: StatusCode, elapsed: Duration) {
    REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), status.as_str()])
        .inc();
    REQUEST_DURATION.observe(elapsed.as_secs_f64());
}

/// Text exposition of the default registry, for the admin `/metrics` route.
pub fn metrics_text() -> (StatusCode, String) {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buf) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("encode metrics: {e}"));
    }
    match String::from_utf8(buf) {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics are not utf-8: {e}")),
    }
}
