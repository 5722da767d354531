use std::fmt;
use std::time::Instant;

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Counter,
    Gauge, Histogram, Unit,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tracing::warn;

use crate::domain::Status;

const EVALUATION_LATENCY: &str = "govai_evaluation_latency_seconds";

/// Upper bounds of the evaluation latency histogram, in seconds.
const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1];

/// Metrics registry for the application.
///
/// Each registry owns its own Prometheus recorder, so handles recorded here
/// never leak into another registry's exposition.
pub struct MetricsRegistry {
    handle: PrometheusHandle,

    evaluations_total: Counter,
    evaluations_approved: Counter,
    evaluations_pending: Counter,
    evaluations_rejected: Counter,
    advisory_downgrades_total: Counter,
    evaluation_latency: Histogram,

    rules_evaluated_total: Counter,
    rule_hits_total: Counter,
    rule_param_errors_total: Counter,

    reviews_total: Counter,
    review_conflicts_total: Counter,

    drift_checks_total: Counter,
    drift_detected_total: Counter,

    storage_errors_total: Counter,
    uptime_seconds: Gauge,
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        let recorder = match PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(EVALUATION_LATENCY.to_string()), LATENCY_BUCKETS)
        {
            Ok(builder) => builder.build_recorder(),
            Err(e) => {
                warn!(error = %e, "Latency buckets rejected, exporting a summary instead");
                PrometheusBuilder::new().build_recorder()
            }
        };
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_counter!("govai_evaluations_total", "Total number of evaluations");
            describe_counter!("govai_evaluations", "Evaluations by returned status");
            describe_counter!(
                "govai_advisory_downgrades_total",
                "Rejections downgraded by advisory mode"
            );
            describe_histogram!(EVALUATION_LATENCY, Unit::Seconds, "Evaluation latency");
            describe_counter!("govai_rules_evaluated_total", "Total rule applications");
            describe_counter!("govai_rule_hits_total", "Total findings produced by rules");
            describe_counter!(
                "govai_rule_param_errors_total",
                "Stored policies skipped for invalid params"
            );
            describe_counter!("govai_reviews_total", "Reviewer updates applied");
            describe_counter!(
                "govai_review_conflicts_total",
                "Reviews rejected for a stale version"
            );
            describe_counter!("govai_drift_checks_total", "Drift checks with enough data");
            describe_counter!(
                "govai_drift_detected_total",
                "Drift checks that detected drift"
            );
            describe_counter!(
                "govai_storage_errors_total",
                "Storage failures during requests"
            );
            describe_gauge!(
                "govai_uptime_seconds",
                Unit::Seconds,
                "Seconds since the service started"
            );

            MetricsRegistry {
                handle,
                evaluations_total: counter!("govai_evaluations_total"),
                evaluations_approved: counter!("govai_evaluations", "status" => "approved"),
                evaluations_pending: counter!("govai_evaluations", "status" => "pending"),
                evaluations_rejected: counter!("govai_evaluations", "status" => "rejected"),
                advisory_downgrades_total: counter!("govai_advisory_downgrades_total"),
                evaluation_latency: histogram!(EVALUATION_LATENCY),
                rules_evaluated_total: counter!("govai_rules_evaluated_total"),
                rule_hits_total: counter!("govai_rule_hits_total"),
                rule_param_errors_total: counter!("govai_rule_param_errors_total"),
                reviews_total: counter!("govai_reviews_total"),
                review_conflicts_total: counter!("govai_review_conflicts_total"),
                drift_checks_total: counter!("govai_drift_checks_total"),
                drift_detected_total: counter!("govai_drift_detected_total"),
                storage_errors_total: counter!("govai_storage_errors_total"),
                uptime_seconds: gauge!("govai_uptime_seconds"),
            }
        })
    }

    /// Record the status returned by an evaluation.
    pub fn record_evaluation(&self, status: Status) {
        self.evaluations_total.increment(1);

        let counter = match status {
            Status::Approved => &self.evaluations_approved,
            Status::Pending => &self.evaluations_pending,
            Status::Rejected => &self.evaluations_rejected,
        };
        counter.increment(1);
    }

    pub fn record_advisory_downgrade(&self) {
        self.advisory_downgrades_total.increment(1);
    }

    /// Record evaluation latency.
    pub fn record_latency(&self, start: Instant) {
        self.evaluation_latency.record(start.elapsed().as_secs_f64());
    }

    /// Record one rule application and how many findings it produced.
    pub fn record_rule_evaluation(&self, findings: usize) {
        self.rules_evaluated_total.increment(1);
        self.rule_hits_total.increment(findings as u64);
    }

    pub fn record_rule_param_error(&self) {
        self.rule_param_errors_total.increment(1);
    }

    /// Record a reviewer update that was applied.
    pub fn record_review(&self) {
        self.reviews_total.increment(1);
    }

    /// Record a review refused because the decision had moved on.
    pub fn record_review_conflict(&self) {
        self.review_conflicts_total.increment(1);
    }

    /// Record a completed drift check.
    pub fn record_drift_check(&self, detected: bool) {
        self.drift_checks_total.increment(1);
        if detected {
            self.drift_detected_total.increment(1);
        }
    }

    pub fn record_storage_error(&self) {
        self.storage_errors_total.increment(1);
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self, uptime_secs: u64) -> String {
        self.uptime_seconds.set(uptime_secs as f64);
        self.handle.render()
    }

    /// Current value of one exported series, e.g. `govai_evaluations{status="pending"}`.
    #[cfg(test)]
    pub(crate) fn sample(&self, series: &str) -> u64 {
        self.handle
            .render()
            .lines()
            .find_map(|line| {
                let value = line.strip_prefix(series)?.strip_prefix(' ')?;
                value.trim().parse::<f64>().ok()
            })
            .map(|v| v as u64)
            .unwrap_or(0)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        MetricsRegistry::new()
    }
}

impl fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRegistry").finish_non_exhaustive()
    }
}

/// Guard for timing operations.
pub struct TimingGuard<'a> {
    registry: &'a MetricsRegistry,
    start: Instant,
}

impl<'a> TimingGuard<'a> {
    pub fn new(registry: &'a MetricsRegistry) -> Self {
        TimingGuard {
            registry,
            start: Instant::now(),
        }
    }

    /// Time elapsed since the guard was created.
    pub fn elapsed_micros(&self) -> u128 {
        self.start.elapsed().as_micros()
    }
}

impl<'a> Drop for TimingGuard<'a> {
    fn drop(&mut self) {
        self.registry.record_latency(self.start);
    }
}
