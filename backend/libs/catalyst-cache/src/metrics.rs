//! Cache metrics for observability

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

static CACHE_LOOKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalyst_cache_lookups_total",
        "Cache lookups by backend and result (hit/miss/corrupt/error)",
        &["backend", "result"]
    )
    .expect("Failed to register cache lookups metric")
});

static CACHE_WRITES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalyst_cache_writes_total",
        "Cache writes by backend",
        &["backend"]
    )
    .expect("Failed to register cache writes metric")
});

static CACHE_INVALIDATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalyst_cache_invalidations_total",
        "Cache invalidations by backend",
        &["backend"]
    )
    .expect("Failed to register cache invalidations metric")
});

pub(crate) fn record_lookup(backend: &str, result: &str) {
    CACHE_LOOKUPS_TOTAL
        .with_label_values(&[backend, result])
        .inc();
}

pub(crate) fn record_write(backend: &str) {
    CACHE_WRITES_TOTAL.with_label_values(&[backend]).inc();
}

pub(crate) fn record_invalidation(backend: &str) {
    CACHE_INVALIDATIONS_TOTAL.with_label_values(&[backend]).inc();
}
