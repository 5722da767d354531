use serde::{Deserialize, Serialize};

use crate::domain::{Evaluation, EvaluationFacts, PolicyMode, RuleType, Status};
use crate::engine::drift::{DEFAULT_THRESHOLD, DEFAULT_WINDOW};
use crate::engine::service::DEFAULT_LIST_LIMIT;
use crate::engine::ReviewRequest;
use crate::error::GovernanceError;
use crate::policy::NewPolicy;

/// A retrieved source backing the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRequest {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
}

/// Request to evaluate one generated answer.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub tenant_id: String,
    pub user_id: String,
    pub prompt: String,
    pub answer: String,
    pub sources: Vec<SourceRequest>,
    pub confidence: f64,
    pub bias_score: f64,
    pub model_id: String,
    #[serde(default)]
    pub consistency_score: f64,
    #[serde(default)]
    pub evidence_flags: Vec<String>,
    #[serde(default = "default_policy_mode")]
    pub policy_mode: String,
}

fn default_policy_mode() -> String {
    "enforce".to_string()
}

impl EvaluateRequest {
    /// Validate and convert into an [`Evaluation`].
    pub fn into_evaluation(self) -> Result<Evaluation, GovernanceError> {
        require_non_blank("tenant_id", &self.tenant_id)?;
        require_non_blank("user_id", &self.user_id)?;
        require_non_blank("model_id", &self.model_id)?;
        require_finite("confidence", self.confidence)?;
        require_finite("bias_score", self.bias_score)?;
        require_finite("consistency_score", self.consistency_score)?;
        let policy_mode = parse_policy_mode(&self.policy_mode)?;

        Ok(Evaluation {
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            model_id: self.model_id,
            policy_mode,
            facts: EvaluationFacts {
                prompt: self.prompt,
                answer: self.answer,
                confidence: self.confidence,
                bias_score: self.bias_score,
                sources_count: self.sources.len(),
                consistency_score: self.consistency_score,
                evidence_flags: self.evidence_flags,
            },
        })
    }
}

/// Request to create a tenant policy.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePolicyRequest {
    pub tenant_id: String,
    pub name: String,
    pub rule_type: String,
    pub params: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl CreatePolicyRequest {
    /// Validate fields; params are checked against the rule type later.
    pub fn into_new_policy(self) -> Result<NewPolicy, GovernanceError> {
        require_non_blank("tenant_id", &self.tenant_id)?;
        require_non_blank("name", &self.name)?;
        let rule_type: RuleType = self
            .rule_type
            .parse()
            .map_err(|e: crate::domain::policy::UnknownRuleType| {
                GovernanceError::validation(e.to_string())
            })?;

        Ok(NewPolicy {
            tenant_id: self.tenant_id,
            name: self.name,
            rule_type,
            params: serde_json::Value::Object(self.params),
            enabled: self.enabled,
        })
    }
}

/// Reviewer update to a decision.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewDecisionRequest {
    pub status: String,
    pub reviewer: String,
    #[serde(default)]
    pub notes: String,
    /// Only apply the review if the decision is still at this version
    #[serde(default)]
    pub expected_version: Option<i32>,
}

impl ReviewDecisionRequest {
    pub fn into_review(self) -> Result<ReviewRequest, GovernanceError> {
        let status = parse_status(&self.status)?;
        require_non_blank("reviewer", &self.reviewer)?;

        Ok(ReviewRequest {
            status,
            reviewer: self.reviewer,
            notes: self.notes,
            expected_version: self.expected_version,
        })
    }
}

/// Query for listing a tenant's policies.
#[derive(Debug, Deserialize)]
pub struct TenantQuery {
    pub tenant_id: String,
}

impl TenantQuery {
    pub fn validate(&self) -> Result<(), GovernanceError> {
        require_non_blank("tenant_id", &self.tenant_id)
    }
}

/// Query for listing decisions.
#[derive(Debug, Deserialize)]
pub struct ListDecisionsQuery {
    pub tenant_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl ListDecisionsQuery {
    /// Returns the status filter and requested limit. An empty status
    /// means no filter.
    pub fn validate(&self) -> Result<(Option<Status>, i64), GovernanceError> {
        require_non_blank("tenant_id", &self.tenant_id)?;

        let status = match self.status.as_deref() {
            None | Some("") => None,
            Some(s) => Some(parse_status(s)?),
        };

        Ok((status, self.limit.unwrap_or(DEFAULT_LIST_LIMIT)))
    }
}

/// Query for a bias drift check.
#[derive(Debug, Deserialize)]
pub struct DriftQuery {
    pub tenant_id: String,
    #[serde(default)]
    pub window: Option<i64>,
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl DriftQuery {
    pub fn validate(&self) -> Result<(i64, f64), GovernanceError> {
        require_non_blank("tenant_id", &self.tenant_id)?;
        let threshold = self.threshold.unwrap_or(DEFAULT_THRESHOLD);
        require_finite("threshold", threshold)?;

        Ok((self.window.unwrap_or(DEFAULT_WINDOW), threshold))
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<(), GovernanceError> {
    if value.trim().is_empty() {
        return Err(GovernanceError::validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

fn require_finite(field: &str, value: f64) -> Result<(), GovernanceError> {
    if !value.is_finite() {
        return Err(GovernanceError::validation(format!(
            "{field} must be a finite number"
        )));
    }
    Ok(())
}

fn parse_status(value: &str) -> Result<Status, GovernanceError> {
    value
        .parse()
        .map_err(|_| GovernanceError::validation(format!("unknown status: {value}")))
}

fn parse_policy_mode(value: &str) -> Result<PolicyMode, GovernanceError> {
    match value {
        "enforce" => Ok(PolicyMode::Enforce),
        "advisory" => Ok(PolicyMode::Advisory),
        other => Err(GovernanceError::validation(format!(
            "policy_mode must be enforce or advisory, got {other}"
        ))),
    }
}
