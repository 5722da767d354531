use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::error::GovernanceError;
use crate::observability::MetricsRegistry;
use crate::storage::AuditRepository;

pub const DEFAULT_WINDOW: i64 = 50;
pub const DEFAULT_THRESHOLD: f64 = 0.1;
pub const MIN_WINDOW: i64 = 10;
pub const MAX_WINDOW: i64 = 500;

/// Means and drift score of two adjacent windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftMeasurement {
    pub tenant_id: String,
    pub window: usize,
    pub recent_mean: f64,
    pub previous_mean: f64,
    pub drift_score: f64,
    pub threshold: f64,
}

/// Result of a drift check, tagged by `status` when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriftReport {
    InsufficientData {
        tenant_id: String,
        required: usize,
        available: usize,
    },
    Stable(DriftMeasurement),
    DriftDetected(DriftMeasurement),
}

impl DriftReport {
    pub fn status(&self) -> &'static str {
        match self {
            DriftReport::InsufficientData { .. } => "insufficient_data",
            DriftReport::Stable(_) => "stable",
            DriftReport::DriftDetected(_) => "drift_detected",
        }
    }
}

/// Clamp a requested window into `[10, 500]`.
pub fn clamp_window(window: i64) -> usize {
    window.clamp(MIN_WINDOW, MAX_WINDOW) as usize
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compare the most recent `window` scores with the `window` before them.
///
/// `scores` must be newest first. Only the first `window * 2` are used.
/// The status is decided on the rounded drift score.
pub fn compute_drift(tenant_id: &str, scores: &[f64], window: usize, threshold: f64) -> DriftReport {
    let required = window * 2;
    if window == 0 || scores.len() < required {
        return DriftReport::InsufficientData {
            tenant_id: tenant_id.to_string(),
            required,
            available: scores.len(),
        };
    }

    let (recent, previous) = scores[..required].split_at(window);
    let recent_mean = mean(recent);
    let previous_mean = mean(previous);

    let measurement = DriftMeasurement {
        tenant_id: tenant_id.to_string(),
        window,
        recent_mean: round4(recent_mean),
        previous_mean: round4(previous_mean),
        drift_score: round4((recent_mean - previous_mean).abs()),
        threshold,
    };

    if measurement.drift_score >= threshold {
        DriftReport::DriftDetected(measurement)
    } else {
        DriftReport::Stable(measurement)
    }
}

/// Detects shifts in a tenant's bias scores over time.
pub struct DriftMonitor {
    repo: Arc<dyn AuditRepository>,
    metrics: Arc<MetricsRegistry>,
}

impl DriftMonitor {
    pub fn new(repo: Arc<dyn AuditRepository>, metrics: Arc<MetricsRegistry>) -> Self {
        DriftMonitor { repo, metrics }
    }

    /// Run a drift check. `window` is clamped into `[10, 500]`.
    pub async fn check(
        &self,
        tenant_id: &str,
        window: i64,
        threshold: f64,
    ) -> Result<DriftReport, GovernanceError> {
        let window = clamp_window(window);

        let scores = self
            .repo
            .recent_bias_scores(tenant_id, (window * 2) as i64)
            .await
            .inspect_err(|_| self.metrics.record_storage_error())?;

        let report = compute_drift(tenant_id, &scores, window, threshold);

        match &report {
            DriftReport::InsufficientData { available, required, .. } => {
                info!(tenant_id, available, required, "Not enough data for drift check");
            }
            DriftReport::Stable(m) | DriftReport::DriftDetected(m) => {
                let detected = matches!(report, DriftReport::DriftDetected(_));
                self.metrics.record_drift_check(detected);
                info!(
                    tenant_id,
                    window,
                    drift_score = m.drift_score,
                    threshold,
                    status = report.status(),
                    "Drift check complete"
                );
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockStorage;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn scores(recent: f64, previous: f64, window: usize) -> Vec<f64> {
        let mut scores = vec![recent; window];
        scores.extend(std::iter::repeat(previous).take(window));
        scores
    }

    #[test]
    fn test_clamp_window() {
        assert_eq!(clamp_window(0), 10);
        assert_eq!(clamp_window(-5), 10);
        assert_eq!(clamp_window(50), 50);
        assert_eq!(clamp_window(10_000), 500);
    }

    #[test]
    fn test_insufficient_data() {
        let report = compute_drift("t1", &[0.1; 99], 50, DEFAULT_THRESHOLD);

        assert_eq!(
            report,
            DriftReport::InsufficientData {
                tenant_id: "t1".to_string(),
                required: 100,
                available: 99,
            }
        );
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"tenant_id": "t1", "status": "insufficient_data", "required": 100, "available": 99})
        );
    }

    #[test]
    fn test_drift_detected_at_threshold() {
        let scores = scores(0.9, 0.1, 50);

        for threshold in [0.1, 0.5, 0.8] {
            let report = compute_drift("t1", &scores, 50, threshold);
            let DriftReport::DriftDetected(m) = report else {
                panic!("expected drift at threshold {threshold}");
            };
            assert_eq!(m.recent_mean, 0.9);
            assert_eq!(m.previous_mean, 0.1);
            assert_eq!(m.drift_score, 0.8);
        }
    }

    #[test]
    fn test_stable_above_drift_score() {
        let report = compute_drift("t1", &scores(0.9, 0.1, 50), 50, 0.81);

        assert_eq!(report.status(), "stable");
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "tenant_id": "t1",
                "status": "stable",
                "window": 50,
                "recent_mean": 0.9,
                "previous_mean": 0.1,
                "drift_score": 0.8,
                "threshold": 0.81
            })
        );
    }

    #[test]
    fn test_extra_scores_are_ignored() {
        let mut scores = scores(0.5, 0.5, 10);
        scores.extend([100.0; 5]);

        let report = compute_drift("t1", &scores, 10, 0.1);

        let DriftReport::Stable(m) = report else {
            panic!("expected stable");
        };
        assert_eq!(m.drift_score, 0.0);
    }

    #[tokio::test]
    async fn test_monitor_uses_newest_scores() {
        let storage = Arc::new(MockStorage::new());
        let now = Utc::now();
        for i in 0..10 {
            storage.push_audit("t1", 0.1, now - Duration::seconds(100 + i));
        }
        for _ in 0..10 {
            storage.push_audit("t1", 0.6, now);
        }
        let metrics = Arc::new(MetricsRegistry::new());
        let monitor = DriftMonitor::new(storage, metrics.clone());

        // Window 3 clamps to 10
        let report = monitor.check("t1", 3, 0.3).await.unwrap();

        let DriftReport::DriftDetected(m) = report else {
            panic!("expected drift");
        };
        assert_eq!(m.window, 10);
        assert_eq!(m.recent_mean, 0.6);
        assert_eq!(m.previous_mean, 0.1);
        assert_eq!(metrics.sample("govai_drift_detected_total"), 1);
    }

    #[tokio::test]
    async fn test_monitor_insufficient_for_other_tenant() {
        let storage = Arc::new(MockStorage::new());
        storage.push_audit("t1", 0.5, Utc::now());
        let monitor = DriftMonitor::new(storage, Arc::new(MetricsRegistry::new()));

        let report = monitor
            .check("t2", DEFAULT_WINDOW, DEFAULT_THRESHOLD)
            .await
            .unwrap();

        assert_eq!(
            report,
            DriftReport::InsufficientData {
                tenant_id: "t2".to_string(),
                required: 100,
                available: 0,
            }
        );
    }
}
