use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("rekaz_hatif_statds")
        .with_description("Rekaz to Hatif bridge statistics")
        .with_unit("request")
        .build()
});

fn incr_statds(metric: &'static str, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

/// Counts a webhook request turned away, keyed by its reason string
pub fn incr_webhook_rejection_statds(reason: &str) {
    incr_statds("webhook_rejection", reason.into())
}

/// Counts a dispatch outcome: `sent`, `failed_transient` or `failed_permanent`
pub fn incr_dispatch_outcome_statds(outcome: &str) {
    incr_statds("dispatch_outcome", outcome.into())
}
