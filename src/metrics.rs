// src/metrics.rs

#[cfg(feature = "metrics")]
mod metrics_impl {
    use once_cell::sync::Lazy;
    use prometheus::{
        register_int_counter_vec, register_int_gauge, register_int_gauge_vec, IntCounterVec,
        IntGauge, IntGaugeVec,
    };

    /// Prometheus metrics for filtering, streaming, polling and posting.
    pub struct Metrics {
        /// Filter verdicts, labelled `accepted` or `rejected`.
        pub items_evaluated_total: IntCounterVec,
        /// Rule failures by rule code.
        pub rule_failures_total: IntCounterVec,
        /// Items handed to caller callbacks, by source.
        pub items_dispatched_total: IntCounterVec,
        /// Completed fetch cycles per polled endpoint.
        pub poll_iterations_total: IntCounterVec,
        /// Current since-id per polled endpoint.
        pub poll_cursor: IntGaugeVec,
        /// Outgoing writes by kind, including silent ones.
        pub posts_total: IntCounterVec,
        /// Errors by component and error kind.
        pub error_count: IntCounterVec,
        /// Live stream subscriptions.
        pub active_streams: IntGauge,
    }

    impl Metrics {
        /// Creates and registers the metrics with the default registry.
        pub fn new() -> Self {
            Self {
                items_evaluated_total: register_int_counter_vec!(
                    "twitbot_items_evaluated_total",
                    "Tweets evaluated by the suitability filter",
                    &["verdict"]
                )
                .expect("failed to create counter"),
                rule_failures_total: register_int_counter_vec!(
                    "twitbot_rule_failures_total",
                    "Suitability rule failures",
                    &["rule"]
                )
                .expect("failed to create counter"),
                items_dispatched_total: register_int_counter_vec!(
                    "twitbot_items_dispatched_total",
                    "Tweets delivered to callers",
                    &["source"]
                )
                .expect("failed to create counter"),
                poll_iterations_total: register_int_counter_vec!(
                    "twitbot_poll_iterations_total",
                    "Completed poll fetch cycles",
                    &["endpoint"]
                )
                .expect("failed to create counter"),
                poll_cursor: register_int_gauge_vec!(
                    "twitbot_poll_cursor",
                    "Highest tweet id seen by a poller",
                    &["endpoint"]
                )
                .expect("failed to create gauge"),
                posts_total: register_int_counter_vec!(
                    "twitbot_posts_total",
                    "Outgoing write requests",
                    &["kind", "silent"]
                )
                .expect("failed to create counter"),
                error_count: register_int_counter_vec!(
                    "twitbot_errors_total",
                    "Total number of errors encountered",
                    &["component", "error_type"]
                )
                .expect("failed to create counter"),
                active_streams: register_int_gauge!(
                    "twitbot_active_streams",
                    "Currently open stream subscriptions"
                )
                .expect("failed to create gauge"),
            }
        }

        pub fn inc_items_evaluated(&self, verdict: &str) {
            self.items_evaluated_total
                .with_label_values(&[verdict])
                .inc();
        }

        pub fn inc_rule_failures(&self, rule: &str) {
            self.rule_failures_total.with_label_values(&[rule]).inc();
        }

        pub fn inc_items_dispatched(&self, source: &str) {
            self.items_dispatched_total
                .with_label_values(&[source])
                .inc();
        }

        /// Records a finished poll cycle and the cursor it left behind.
        pub fn record_poll(&self, endpoint: &str, cursor: u64) {
            self.poll_iterations_total
                .with_label_values(&[endpoint])
                .inc();
            self.poll_cursor
                .with_label_values(&[endpoint])
                .set(i64::try_from(cursor).unwrap_or(i64::MAX));
        }

        pub fn inc_posts(&self, kind: &str, silent: bool) {
            let silent = if silent { "true" } else { "false" };
            self.posts_total.with_label_values(&[kind, silent]).inc();
        }

        /// Records an error occurrence.
        ///
        /// # Arguments
        ///
        /// * `component` - The component where the error occurred
        /// * `error_type` - The type of error that occurred
        pub fn record_error(&self, component: &str, error_type: &str) {
            self.error_count
                .with_label_values(&[component, error_type])
                .inc();
        }

        pub fn stream_opened(&self) {
            self.active_streams.inc();
        }

        pub fn stream_closed(&self) {
            self.active_streams.dec();
        }
    }

    pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);
}

#[cfg(feature = "metrics")]
pub use metrics_impl::*;

////////////////////////////////////////////////////
// When the metrics feature is disabled, provide a stub
#[cfg(not(feature = "metrics"))]
mod metrics_stub {
    /// No-op metrics used when the `metrics` feature is off.
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Self {
            Metrics
        }

        pub fn inc_items_evaluated(&self, _verdict: &str) {}

        pub fn inc_rule_failures(&self, _rule: &str) {}

        pub fn inc_items_dispatched(&self, _source: &str) {}

        pub fn record_poll(&self, _endpoint: &str, _cursor: u64) {}

        pub fn inc_posts(&self, _kind: &str, _silent: bool) {}

        /// Records an error occurrence.
        ///
        /// # Arguments
        ///
        /// * `component` - The component where the error occurred
        /// * `error_type` - The type of error that occurred
        pub fn record_error(&self, _component: &str, _error_type: &str) {}

        pub fn stream_opened(&self) {}

        pub fn stream_closed(&self) {}
    }

    /// The global metrics instance used throughout the crate.
    pub static METRICS: Metrics = Metrics;
}

#[cfg(not(feature = "metrics"))]
pub use metrics_stub::*;
