//! Prometheus metrics for catalyst-service.
//!
//! Exposes scoring, timeline and HTTP collectors plus the `/metrics` handler.

use actix_web::{dev::ServiceResponse, HttpResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Duration;

pub mod interactions;
pub mod timeline;
pub mod trending;

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalyst_http_requests_total",
        "HTTP requests by method, route and status",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP requests metric")
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "catalyst_http_request_duration_seconds",
        "HTTP request latency by method and route",
        &["method", "path"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register HTTP duration metric")
});

/// Record one finished HTTP request. `path` should be the route pattern,
/// not the raw path, to keep label cardinality bounded.
pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(elapsed.as_secs_f64());
}

/// Status to record for a finished request. Middleware rejections come back
/// as `Err` and still carry their own status code.
pub fn response_status<B>(result: &Result<ServiceResponse<B>, actix_web::Error>) -> u16 {
    match result {
        Ok(res) => res.status().as_u16(),
        Err(err) => err.as_response_error().status_code().as_u16(),
    }
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
