use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{AuditLog, Decision, DecisionSummary, Evaluation, EvaluationRecord, Verdict};
use crate::error::GovernanceError;
use crate::storage::DecisionRepository;

/// Writes the audit snapshot and decision for one evaluation.
pub struct AuditRecorder {
    repo: Arc<dyn DecisionRepository>,
}

impl AuditRecorder {
    pub fn new(repo: Arc<dyn DecisionRepository>) -> Self {
        AuditRecorder { repo }
    }

    /// Build the audit row and its linked decision.
    ///
    /// Both share one timestamp; the decision starts at version 1.
    pub fn build_record(evaluation: &Evaluation, verdict: &Verdict) -> EvaluationRecord {
        let now = Utc::now();
        let audit_id = Uuid::new_v4();
        let facts = &evaluation.facts;

        EvaluationRecord {
            audit: AuditLog {
                id: audit_id,
                tenant_id: evaluation.tenant_id.clone(),
                user_id: evaluation.user_id.clone(),
                prompt: facts.prompt.clone(),
                answer: facts.answer.clone(),
                confidence: facts.confidence,
                bias_score: facts.bias_score,
                model_id: evaluation.model_id.clone(),
                decision_status: verdict.status,
                created_at: now,
            },
            decision: Decision {
                id: Uuid::new_v4(),
                audit_id,
                tenant_id: evaluation.tenant_id.clone(),
                status: verdict.status,
                reasons: verdict.reasons.clone(),
                policy_hits: verdict.policy_hits.clone(),
                reviewer: None,
                review_notes: None,
                version: 1,
                created_at: now,
                updated_at: now,
            },
        }
    }

    /// Persist the pair atomically and return the caller-facing summary.
    pub async fn record(
        &self,
        evaluation: &Evaluation,
        verdict: &Verdict,
    ) -> Result<DecisionSummary, GovernanceError> {
        let record = Self::build_record(evaluation, verdict);
        self.repo.record_evaluation(&record).await?;
        Ok(DecisionSummary::from(&record.decision))
    }
}
