use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{AuditLog, Decision, PolicyHit, Status};

/// Acknowledgement of a reviewer update.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub status: &'static str,
    pub decision_id: Uuid,
    pub version: i32,
}

impl ReviewResponse {
    pub fn updated(decision_id: Uuid, version: i32) -> Self {
        ReviewResponse {
            status: "updated",
            decision_id,
            version,
        }
    }
}

/// One row of a decision listing.
#[derive(Debug, Serialize)]
pub struct DecisionListItem {
    pub id: Uuid,
    pub status: Status,
    pub reasons: Vec<String>,
    pub policy_hits: Vec<PolicyHit>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Decision> for DecisionListItem {
    fn from(d: Decision) -> Self {
        DecisionListItem {
            id: d.id,
            status: d.status,
            reasons: d.reasons,
            policy_hits: d.policy_hits,
            version: d.version,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

/// Decision portion of a detail response.
#[derive(Debug, Serialize)]
pub struct DecisionView {
    pub id: Uuid,
    pub status: Status,
    pub reasons: Vec<String>,
    pub policy_hits: Vec<PolicyHit>,
    pub reviewer: Option<String>,
    pub review_notes: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit snapshot portion of a detail response.
#[derive(Debug, Serialize)]
pub struct AuditView {
    pub tenant_id: String,
    pub user_id: String,
    pub prompt: String,
    pub answer: String,
    pub confidence: f64,
    pub bias_score: f64,
    pub model_id: String,
    pub decision_status: Status,
    pub created_at: DateTime<Utc>,
}

/// A decision joined with the audit snapshot it came from.
#[derive(Debug, Serialize)]
pub struct DecisionDetailResponse {
    pub decision: DecisionView,
    pub audit: AuditView,
}

impl DecisionDetailResponse {
    pub fn new(decision: Decision, audit: AuditLog) -> Self {
        DecisionDetailResponse {
            decision: DecisionView {
                id: decision.id,
                status: decision.status,
                reasons: decision.reasons,
                policy_hits: decision.policy_hits,
                reviewer: decision.reviewer,
                review_notes: decision.review_notes,
                version: decision.version,
                created_at: decision.created_at,
                updated_at: decision.updated_at,
            },
            audit: AuditView {
                tenant_id: audit.tenant_id,
                user_id: audit.user_id,
                prompt: audit.prompt,
                answer: audit.answer,
                confidence: audit.confidence,
                bias_score: audit.bias_score,
                model_id: audit.model_id,
                decision_status: audit.decision_status,
                created_at: audit.created_at,
            },
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            code: code.into(),
        }
    }
}
