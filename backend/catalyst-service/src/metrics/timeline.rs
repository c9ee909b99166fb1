//! Timeline composition metrics

use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, HistogramVec};
use std::time::Duration;

static COMPOSE_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "catalyst_timeline_compose_duration_seconds",
        "Time to load sources and compose one timeline page",
        &["scope"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to register timeline compose metric")
});

pub fn observe_compose(scope: &str, duration: Duration) {
    COMPOSE_DURATION_SECONDS
        .with_label_values(&[scope])
        .observe(duration.as_secs_f64());
}
