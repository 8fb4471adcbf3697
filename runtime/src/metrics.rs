//! Metric names and recorders for the store runtime.
//!
//! The runtime only records through the `metrics` facade. Installing an
//! exporter is left to the embedding application; without one every call is
//! a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use std::time::Duration;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Register descriptions for every metric emitted by the runtime.
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!("store_actions_total", "Total number of actions reduced");
    describe_histogram!(
        "store_reducer_duration_seconds",
        "Time spent inside the reducer per action"
    );
    describe_counter!(
        "store_state_changes_total",
        "Number of reductions that changed state"
    );
    describe_counter!(
        "store_effects_executed_total",
        "Effects executed, labelled by type"
    );
    describe_counter!(
        "store_effects_cancelled_total",
        "Effects aborted before completion"
    );
    describe_counter!(
        "store_subscribers_dropped_total",
        "Subscribers removed because their receiver was dropped"
    );
    describe_gauge!("store_loading_tasks", "Loading tasks currently in flight");
}

/// Reducer-side metrics.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record one reduced action.
    pub fn record_action(duration: Duration) {
        counter!("store_actions_total").increment(1);
        histogram!("store_reducer_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a reduction that produced a new state version.
    pub fn record_state_change() {
        counter!("store_state_changes_total").increment(1);
    }

    /// Record subscribers pruned after their receivers were dropped.
    pub fn record_dropped_subscribers(count: usize) {
        if count > 0 {
            counter!("store_subscribers_dropped_total").increment(count as u64);
        }
    }
}

/// Effect execution metrics.
pub struct EffectMetrics;

impl EffectMetrics {
    /// Record an effect being executed.
    pub fn record_execution(kind: &'static str) {
        counter!("store_effects_executed_total", "type" => kind).increment(1);
    }

    /// Record an aborted effect.
    pub fn record_cancelled() {
        counter!("store_effects_cancelled_total").increment(1);
    }
}

/// Loading indicator metrics.
pub struct LoadingMetrics;

impl LoadingMetrics {
    /// Record the current number of in-flight loading tasks.
    #[allow(clippy::cast_precision_loss)] // Task counts stay far below 2^52
    pub fn record_in_flight(count: usize) {
        gauge!("store_loading_tasks").set(count as f64);
    }
}
