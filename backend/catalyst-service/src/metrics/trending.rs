//! Trend scoring metrics

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge_vec, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec,
};
use std::time::Duration;

use crate::services::trending::{EntityKind, TrendDimension};

static SCORING_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalyst_scoring_runs_total",
        "Scoring passes by outcome (success/partial/snapshot_error)",
        &["status"]
    )
    .expect("Failed to register scoring runs metric")
});

static SCORING_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "catalyst_scoring_duration_seconds",
        "Duration of scoring passes",
        &["status"],
        vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]
    )
    .expect("Failed to register scoring duration metric")
});

static SCORING_FAILED_WRITES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "catalyst_scoring_failed_writes_total",
        "Score writes that failed during scoring passes"
    )
    .expect("Failed to register scoring failed writes metric")
});

static TRENDING_ENTITIES: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "catalyst_trending_entities",
        "Entities flagged trending after the last pass",
        &["entity", "dimension"]
    )
    .expect("Failed to register trending entities metric")
});

pub fn record_scoring_run(status: &str, duration: Duration) {
    SCORING_RUNS_TOTAL.with_label_values(&[status]).inc();
    SCORING_DURATION_SECONDS
        .with_label_values(&[status])
        .observe(duration.as_secs_f64());
}

pub fn record_failed_writes(count: usize) {
    SCORING_FAILED_WRITES_TOTAL.inc_by(count as u64);
}

pub fn set_trending_entities(kind: EntityKind, dimension: TrendDimension, count: usize) {
    TRENDING_ENTITIES
        .with_label_values(&[kind.as_str(), dimension.as_str()])
        .set(count as i64);
}
