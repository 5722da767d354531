use serde::{Deserialize, Serialize};

use super::policy::RuleType;
use super::Status;

/// Record of a policy that contributed to a verdict.
///
/// Stored alongside the decision so reviewers and the explanation
/// service can see which configured rule produced each reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyHit {
    /// Id of the triggering policy (synthetic for default rules)
    pub policy_id: String,

    /// Kind of rule that triggered
    pub rule: RuleType,
}

impl PolicyHit {
    pub fn new(policy_id: impl Into<String>, rule: RuleType) -> Self {
        PolicyHit {
            policy_id: policy_id.into(),
            rule,
        }
    }
}

/// A single triggered check inside one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// Status this finding pushes the verdict towards
    pub severity: Status,

    /// Human readable reason
    pub reason: String,
}

/// Result of evaluating a rule.
///
/// A rule may report several findings (grounding and human review
/// rules check independent conditions).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleResult {
    pub findings: Vec<Finding>,
}

impl RuleResult {
    /// Create a non-triggering result.
    #[inline]
    pub fn pass() -> Self {
        RuleResult::default()
    }

    /// Add a finding that escalates to pending.
    pub fn escalate(mut self, reason: impl Into<String>) -> Self {
        self.findings.push(Finding {
            severity: Status::Pending,
            reason: reason.into(),
        });
        self
    }

    /// Add a finding that forces rejection.
    pub fn reject(mut self, reason: impl Into<String>) -> Self {
        self.findings.push(Finding {
            severity: Status::Rejected,
            reason: reason.into(),
        });
        self
    }

    /// Add an escalation only when `condition` holds.
    pub fn escalate_if(self, condition: bool, reason: impl Into<String>) -> Self {
        if condition {
            self.escalate(reason)
        } else {
            self
        }
    }

    #[inline]
    pub fn hit(&self) -> bool {
        !self.findings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_hit_serialization() {
        let hit = PolicyHit::new("default-confidence", RuleType::RequireConfidence);
        let json = serde_json::to_value(&hit).unwrap();

        assert_eq!(json["policy_id"], "default-confidence");
        assert_eq!(json["rule"], "REQUIRE_CONFIDENCE");
    }

    #[test]
    fn test_rule_result_builders() {
        let result = RuleResult::pass()
            .escalate_if(false, "skipped")
            .escalate("held")
            .reject("blocked");

        assert!(result.hit());
        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.findings[0].severity, Status::Pending);
        assert_eq!(result.findings[1].severity, Status::Rejected);
    }

    #[test]
    fn test_pass_has_no_findings() {
        assert!(!RuleResult::pass().hit());
    }
}
