use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PolicyDefaults;
use crate::domain::{PolicyRecord, RuleType};
use crate::error::GovernanceError;
use crate::observability::MetricsRegistry;
use crate::rules::{RuleKind, RuleSet};
use crate::storage::PolicyRepository;

use super::defaults::default_rules;

/// A validated policy creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPolicy {
    pub tenant_id: String,
    pub name: String,
    pub rule_type: RuleType,
    pub params: serde_json::Value,
    pub enabled: bool,
}

/// Resolves the effective rule set for a tenant and manages its policies.
pub struct PolicyStore {
    repo: Arc<dyn PolicyRepository>,
    defaults: PolicyDefaults,
    metrics: Arc<MetricsRegistry>,
}

impl PolicyStore {
    pub fn new(
        repo: Arc<dyn PolicyRepository>,
        defaults: PolicyDefaults,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        PolicyStore {
            repo,
            defaults,
            metrics,
        }
    }

    /// Create a policy after checking its params compile for its rule type.
    pub async fn create(&self, policy: NewPolicy) -> Result<PolicyRecord, GovernanceError> {
        RuleKind::compile(policy.rule_type.as_str(), &policy.params)?;

        let record = PolicyRecord {
            id: Uuid::new_v4().to_string(),
            tenant_id: policy.tenant_id,
            name: policy.name,
            rule_type: policy.rule_type.as_str().to_string(),
            params: policy.params,
            enabled: policy.enabled,
        };

        self.repo.create_policy(&record).await?;

        info!(
            tenant_id = %record.tenant_id,
            policy_id = %record.id,
            rule_type = %record.rule_type,
            enabled = record.enabled,
            "Policy created"
        );

        Ok(record)
    }

    pub async fn list(&self, tenant_id: &str) -> Result<Vec<PolicyRecord>, GovernanceError> {
        Ok(self.repo.list_policies(tenant_id).await?)
    }

    /// Effective rules: the tenant's own policies if any exist, otherwise
    /// the built-in defaults. Custom policies replace the defaults entirely.
    ///
    /// Stored policies whose params no longer compile are skipped, but they
    /// still count as custom policies.
    pub async fn resolve(&self, tenant_id: &str) -> Result<RuleSet, GovernanceError> {
        let records = self.repo.list_policies(tenant_id).await?;

        if records.is_empty() {
            debug!(tenant_id, "No custom policies, using defaults");
            return Ok(default_rules(&self.defaults));
        }

        let (ruleset, errors) = RuleSet::from_records(&records);
        for (policy_id, error) in errors {
            self.metrics.record_rule_param_error();
            warn!(tenant_id, policy_id = %policy_id, error = %error, "Skipping policy with invalid params");
        }

        Ok(ruleset)
    }
}
