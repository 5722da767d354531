// src/storage/traits.rs
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    AuditLog, Decision, EvaluationRecord, PolicyRecord, Review, ReviewOutcome, Status,
};

/// Tenant policy persistence.
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn create_policy(&self, policy: &PolicyRecord) -> anyhow::Result<()>;

    /// All policies for a tenant, in creation order.
    async fn list_policies(&self, tenant_id: &str) -> anyhow::Result<Vec<PolicyRecord>>;
}

/// Audit + decision persistence and the review workflow.
#[async_trait]
pub trait DecisionRepository: Send + Sync {
    /// Persist the audit row and its decision atomically: both or neither.
    async fn record_evaluation(&self, record: &EvaluationRecord) -> anyhow::Result<()>;

    /// Most recent decisions first; `limit` is already clamped by the caller.
    async fn list_decisions(
        &self,
        tenant_id: &str,
        status: Option<Status>,
        limit: i64,
    ) -> anyhow::Result<Vec<Decision>>;

    /// A decision joined with the audit row it was created from.
    async fn decision_detail(&self, decision_id: Uuid)
        -> anyhow::Result<Option<(Decision, AuditLog)>>;

    async fn review_decision(
        &self,
        decision_id: Uuid,
        review: &Review,
    ) -> anyhow::Result<ReviewOutcome>;
}

/// Read access to historical audit data.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Bias scores for a tenant, newest first, ties broken by insertion order.
    async fn recent_bias_scores(&self, tenant_id: &str, limit: i64) -> anyhow::Result<Vec<f64>>;
}
