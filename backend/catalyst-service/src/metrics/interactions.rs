use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

use crate::domain::InteractionType;

static INTERACTION_CHANGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalyst_interaction_changes_total",
        "Interactions added or removed, by type",
        &["action", "type"]
    )
    .expect("Failed to register interaction changes metric")
});

pub fn record_change(action: &str, interaction_type: InteractionType) {
    INTERACTION_CHANGES_TOTAL
        .with_label_values(&[action, interaction_type.as_str()])
        .inc();
}
