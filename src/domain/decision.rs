use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PolicyHit, Status};

/// Immutable snapshot of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub tenant_id: String,
    pub user_id: String,
    pub prompt: String,
    pub answer: String,
    pub confidence: f64,
    pub bias_score: f64,
    pub model_id: String,
    /// Verdict at creation time; does not follow later reviews
    pub decision_status: Status,
    pub created_at: DateTime<Utc>,
}

/// Mutable verdict record linked one-to-one with an [`AuditLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: Uuid,
    pub audit_id: Uuid,
    pub tenant_id: String,
    pub status: Status,
    pub reasons: Vec<String>,
    pub policy_hits: Vec<PolicyHit>,
    pub reviewer: Option<String>,
    pub review_notes: Option<String>,
    /// Starts at 1, incremented by every review
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An audit row and its decision, written together.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub audit: AuditLog,
    pub decision: Decision,
}

/// Outcome of the evaluator, before persistence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    pub status: Status,
    pub reasons: Vec<String>,
    pub policy_hits: Vec<PolicyHit>,
}

/// Result returned to the caller of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSummary {
    pub decision_id: Uuid,
    pub status: Status,
    pub reasons: Vec<String>,
    pub policy_hits: Vec<PolicyHit>,
}

impl From<&Decision> for DecisionSummary {
    fn from(decision: &Decision) -> Self {
        DecisionSummary {
            decision_id: decision.id,
            status: decision.status,
            reasons: decision.reasons.clone(),
            policy_hits: decision.policy_hits.clone(),
        }
    }
}

/// A reviewer's update to a decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub status: Status,
    pub reviewer: String,
    pub notes: String,
    /// When set, the review only applies if the decision is still at this version
    pub expected_version: Option<i32>,
    pub reviewed_at: DateTime<Utc>,
}

/// What happened to a review request at the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Updated { version: i32 },
    NotFound,
    Conflict { current_version: i32 },
}
