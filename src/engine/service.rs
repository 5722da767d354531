use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PolicyDefaults;
use crate::domain::{
    AuditLog, Decision, DecisionSummary, Evaluation, PolicyRecord, Review, ReviewOutcome, Status,
};
use crate::error::GovernanceError;
use crate::observability::{MetricsRegistry, TimingGuard};
use crate::policy::{NewPolicy, PolicyStore};
use crate::storage::{DecisionRepository, Repositories};

use super::evaluator::PolicyEvaluator;
use super::recorder::AuditRecorder;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

/// Clamp a requested listing limit into `[1, 200]`.
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIST_LIMIT)
}

/// A reviewer's requested change to a decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRequest {
    pub status: Status,
    pub reviewer: String,
    pub notes: String,
    pub expected_version: Option<i32>,
}

/// Orchestrates policy resolution, evaluation, recording and review.
pub struct GovernanceService {
    policies: PolicyStore,
    evaluator: PolicyEvaluator,
    recorder: AuditRecorder,
    decisions: Arc<dyn DecisionRepository>,
    metrics: Arc<MetricsRegistry>,
}

impl GovernanceService {
    pub fn new(
        repos: &Repositories,
        defaults: PolicyDefaults,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        GovernanceService {
            policies: PolicyStore::new(repos.policies.clone(), defaults, metrics.clone()),
            evaluator: PolicyEvaluator::with_metrics(metrics.clone()),
            recorder: AuditRecorder::new(repos.decisions.clone()),
            decisions: repos.decisions.clone(),
            metrics,
        }
    }

    /// Evaluate an answer against the tenant's effective rules and record
    /// the outcome. Nothing is persisted if recording fails.
    pub async fn evaluate(&self, evaluation: Evaluation) -> Result<DecisionSummary, GovernanceError> {
        let timer = TimingGuard::new(&self.metrics);

        let ruleset = self.track(self.policies.resolve(&evaluation.tenant_id).await)?;
        let verdict = self.evaluator.evaluate_with_mode(
            &ruleset.rules,
            &evaluation.facts,
            evaluation.policy_mode,
        );

        let summary = self.track(self.recorder.record(&evaluation, &verdict).await)?;
        self.metrics.record_evaluation(summary.status);

        info!(
            tenant_id = %evaluation.tenant_id,
            decision_id = %summary.decision_id,
            status = %summary.status,
            hits = summary.policy_hits.len(),
            rule_source = ?ruleset.source,
            latency_us = timer.elapsed_micros() as u64,
            "Evaluation recorded"
        );

        Ok(summary)
    }

    pub async fn create_policy(&self, policy: NewPolicy) -> Result<PolicyRecord, GovernanceError> {
        self.track(self.policies.create(policy).await)
    }

    pub async fn list_policies(&self, tenant_id: &str) -> Result<Vec<PolicyRecord>, GovernanceError> {
        self.track(self.policies.list(tenant_id).await)
    }

    /// Newest decisions first, `limit` clamped into `[1, 200]`.
    pub async fn list_decisions(
        &self,
        tenant_id: &str,
        status: Option<Status>,
        limit: i64,
    ) -> Result<Vec<Decision>, GovernanceError> {
        let result = self
            .decisions
            .list_decisions(tenant_id, status, clamp_limit(limit))
            .await;
        self.track(result.map_err(GovernanceError::from))
    }

    /// A decision together with the audit snapshot it was created from.
    pub async fn decision_detail(
        &self,
        decision_id: &str,
    ) -> Result<(Decision, AuditLog), GovernanceError> {
        let id = parse_decision_id(decision_id)?;

        let result = self.decisions.decision_detail(id).await;
        self.track(result.map_err(GovernanceError::from))?
            .ok_or_else(GovernanceError::decision_not_found)
    }

    /// Apply a reviewer's update. Returns the decision id and its new version.
    pub async fn review_decision(
        &self,
        decision_id: &str,
        request: ReviewRequest,
    ) -> Result<(Uuid, i32), GovernanceError> {
        let id = parse_decision_id(decision_id)?;
        let review = Review {
            status: request.status,
            reviewer: request.reviewer,
            notes: request.notes,
            expected_version: request.expected_version,
            reviewed_at: Utc::now(),
        };

        let result = self.decisions.review_decision(id, &review).await;
        match self.track(result.map_err(GovernanceError::from))? {
            ReviewOutcome::Updated { version } => {
                self.metrics.record_review();
                info!(
                    decision_id = %id,
                    status = %review.status,
                    reviewer = %review.reviewer,
                    version,
                    "Decision reviewed"
                );
                Ok((id, version))
            }
            ReviewOutcome::Conflict { current_version } => {
                self.metrics.record_review_conflict();
                warn!(
                    decision_id = %id,
                    expected_version = ?review.expected_version,
                    current_version,
                    "Review rejected for stale version"
                );
                Err(GovernanceError::Conflict(format!(
                    "Decision is at version {current_version}"
                )))
            }
            ReviewOutcome::NotFound => Err(GovernanceError::decision_not_found()),
        }
    }

    /// Count storage failures on their way out. The HTTP layer logs them.
    fn track<T>(&self, result: Result<T, GovernanceError>) -> Result<T, GovernanceError> {
        if let Err(GovernanceError::Storage(_)) = &result {
            self.metrics.record_storage_error();
        }
        result
    }
}

/// Malformed ids cannot name an existing decision.
fn parse_decision_id(decision_id: &str) -> Result<Uuid, GovernanceError> {
    Uuid::parse_str(decision_id).map_err(|_| GovernanceError::decision_not_found())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EvaluationFacts, PolicyMode, RuleType};
    use crate::storage::MockStorage;
    use serde_json::json;

    struct Harness {
        storage: Arc<MockStorage>,
        metrics: Arc<MetricsRegistry>,
        service: GovernanceService,
    }

    fn harness() -> Harness {
        crate::observability::tracing::init_test_tracing();
        let storage = Arc::new(MockStorage::new());
        let metrics = Arc::new(MetricsRegistry::new());
        let service = GovernanceService::new(
            &Repositories::from_backend(storage.clone()),
            PolicyDefaults::default(),
            metrics.clone(),
        );
        Harness {
            storage,
            metrics,
            service,
        }
    }

    fn evaluation(tenant_id: &str, mode: PolicyMode) -> Evaluation {
        Evaluation {
            tenant_id: tenant_id.to_string(),
            user_id: "u1".to_string(),
            model_id: "m1".to_string(),
            policy_mode: mode,
            facts: EvaluationFacts {
                prompt: "Tell me about widgets".to_string(),
                answer: "Widgets are great.".to_string(),
                confidence: 0.9,
                bias_score: 0.0,
                sources_count: 2,
                consistency_score: 0.9,
                evidence_flags: vec![],
            },
        }
    }

    fn review(status: Status, expected_version: Option<i32>) -> ReviewRequest {
        ReviewRequest {
            status,
            reviewer: "alice".to_string(),
            notes: "checked".to_string(),
            expected_version,
        }
    }

    async fn block_widgets(service: &GovernanceService, tenant_id: &str) {
        service
            .create_policy(NewPolicy {
                tenant_id: tenant_id.to_string(),
                name: "No widgets".to_string(),
                rule_type: RuleType::BlocklistTerm,
                params: json!({"terms": ["WIDGET"]}),
                enabled: true,
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(1000), 200);
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(-3), 1);
        assert_eq!(clamp_limit(DEFAULT_LIST_LIMIT), 50);
    }

    #[tokio::test]
    async fn test_evaluate_with_defaults_approves() {
        let h = harness();

        let summary = h
            .service
            .evaluate(evaluation("t1", PolicyMode::Enforce))
            .await
            .unwrap();

        assert_eq!(summary.status, Status::Approved);
        assert!(summary.reasons.is_empty());
        assert_eq!(h.storage.decision_count(), 1);
        assert_eq!(h.metrics.sample("govai_evaluations{status=\"approved\"}"), 1);
    }

    #[tokio::test]
    async fn test_evaluate_custom_blocklist_and_advisory() {
        let h = harness();
        block_widgets(&h.service, "t1").await;

        let enforced = h
            .service
            .evaluate(evaluation("t1", PolicyMode::Enforce))
            .await
            .unwrap();
        assert_eq!(enforced.status, Status::Rejected);

        let advisory = h
            .service
            .evaluate(evaluation("t1", PolicyMode::Advisory))
            .await
            .unwrap();
        assert_eq!(advisory.status, Status::Pending);
        assert_eq!(
            advisory.reasons.last().map(String::as_str),
            Some(crate::engine::ADVISORY_DOWNGRADE_REASON)
        );

        let (_, audit) = h
            .service
            .decision_detail(&advisory.decision_id.to_string())
            .await
            .unwrap();
        assert_eq!(audit.decision_status, Status::Pending);
    }

    #[tokio::test]
    async fn test_evaluate_storage_failure_leaves_nothing() {
        let h = harness();
        h.storage.set_fail_writes(true);

        let err = h
            .service
            .evaluate(evaluation("t1", PolicyMode::Enforce))
            .await
            .unwrap_err();

        assert!(matches!(err, GovernanceError::Storage(_)));
        assert_eq!(h.storage.audit_count(), 0);
        assert_eq!(h.storage.decision_count(), 0);
        assert_eq!(h.metrics.sample("govai_storage_errors_total"), 1);
        assert_eq!(h.metrics.sample("govai_evaluations_total"), 0);
    }

    #[tokio::test]
    async fn test_list_decisions_filters_and_clamps() {
        let h = harness();
        block_widgets(&h.service, "t1").await;
        for _ in 0..3 {
            h.service
                .evaluate(evaluation("t1", PolicyMode::Enforce))
                .await
                .unwrap();
        }
        h.service
            .evaluate(evaluation("t1", PolicyMode::Advisory))
            .await
            .unwrap();

        let rejected = h
            .service
            .list_decisions("t1", Some(Status::Rejected), 1000)
            .await
            .unwrap();
        assert_eq!(rejected.len(), 3);

        let one = h.service.list_decisions("t1", None, 0).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].status, Status::Pending);
    }

    #[tokio::test]
    async fn test_review_updates_decision_not_audit() {
        let h = harness();
        block_widgets(&h.service, "t1").await;
        let summary = h
            .service
            .evaluate(evaluation("t1", PolicyMode::Enforce))
            .await
            .unwrap();
        let id = summary.decision_id.to_string();

        let (_, version) = h
            .service
            .review_decision(&id, review(Status::Approved, None))
            .await
            .unwrap();
        assert_eq!(version, 2);

        let (decision, audit) = h.service.decision_detail(&id).await.unwrap();
        assert_eq!(decision.status, Status::Approved);
        assert_eq!(decision.reviewer.as_deref(), Some("alice"));
        assert_eq!(decision.review_notes.as_deref(), Some("checked"));
        assert!(decision.updated_at >= decision.created_at);
        assert_eq!(audit.decision_status, Status::Rejected);
    }

    #[tokio::test]
    async fn test_review_any_transition_allowed() {
        let h = harness();
        let summary = h
            .service
            .evaluate(evaluation("t1", PolicyMode::Enforce))
            .await
            .unwrap();
        let id = summary.decision_id.to_string();

        for status in [Status::Rejected, Status::Pending, Status::Approved] {
            h.service
                .review_decision(&id, review(status, None))
                .await
                .unwrap();
        }

        let (decision, _) = h.service.decision_detail(&id).await.unwrap();
        assert_eq!(decision.status, Status::Approved);
        assert_eq!(decision.version, 4);
    }

    #[tokio::test]
    async fn test_review_stale_version_conflicts() {
        let h = harness();
        let summary = h
            .service
            .evaluate(evaluation("t1", PolicyMode::Enforce))
            .await
            .unwrap();
        let id = summary.decision_id.to_string();

        h.service
            .review_decision(&id, review(Status::Pending, Some(1)))
            .await
            .unwrap();
        let err = h
            .service
            .review_decision(&id, review(Status::Rejected, Some(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, GovernanceError::Conflict(_)));
        let (decision, _) = h.service.decision_detail(&id).await.unwrap();
        assert_eq!(decision.status, Status::Pending);
        assert_eq!(h.metrics.sample("govai_review_conflicts_total"), 1);
        assert_eq!(h.metrics.sample("govai_reviews_total"), 1);
    }

    #[tokio::test]
    async fn test_unknown_decision_is_not_found() {
        let h = harness();

        let missing = Uuid::new_v4().to_string();
        assert!(matches!(
            h.service.decision_detail(&missing).await,
            Err(GovernanceError::NotFound(_))
        ));
        assert!(matches!(
            h.service.decision_detail("not-a-uuid").await,
            Err(GovernanceError::NotFound(_))
        ));
        assert!(matches!(
            h.service
                .review_decision(&missing, review(Status::Approved, None))
                .await,
            Err(GovernanceError::NotFound(_))
        ));
    }
}
