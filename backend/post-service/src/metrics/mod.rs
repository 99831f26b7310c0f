//! Prometheus metrics for post-service.
//!
//! Exposes post/blob operation collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Post operations by name (list, create, show, update, delete) and outcome.
    pub static ref POST_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_operations_total",
        "Post resource operations segmented by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("failed to register post_operations_total");

    /// Blob store calls by operation (put, delete) and result (success/error).
    pub static ref BLOB_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blob_operations_total",
        "Blob store operations segmented by operation and result",
        &["operation", "result"]
    )
    .expect("failed to register blob_operations_total");

    /// HTTP request latency by method and response status.
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register http_request_duration_seconds");
}

/// Count one post operation
pub fn record_post_operation(operation: &str, outcome: &str) {
    POST_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Count one blob store call
pub fn record_blob_operation(operation: &str, ok: bool) {
    let result = if ok { "success" } else { "error" };
    BLOB_OPERATIONS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
