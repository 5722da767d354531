use std::sync::Arc;

use tracing::trace;

use crate::domain::{EvaluationFacts, PolicyHit, PolicyMode, Status, Verdict};
use crate::observability::MetricsRegistry;
use crate::rules::{PolicyRule, Rule};

/// Reason appended when advisory mode downgrades a rejection.
pub const ADVISORY_DOWNGRADE_REASON: &str = "Advisory mode: rejection downgraded to pending";

/// Applies an ordered list of policy rules to the facts of one answer.
///
/// The final status is the highest severity of any finding. Because
/// `rejected` is the top of the ordering, a blocklist match can never be
/// lowered by a later rule. Reasons and hits keep rule order.
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    metrics: Option<Arc<MetricsRegistry>>,
}

impl PolicyEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator that counts rule applications and hits.
    pub fn with_metrics(metrics: Arc<MetricsRegistry>) -> Self {
        PolicyEvaluator {
            metrics: Some(metrics),
        }
    }

    /// Evaluate all enabled rules in order.
    pub fn evaluate(&self, rules: &[PolicyRule], facts: &EvaluationFacts) -> Verdict {
        let mut verdict = Verdict::default();

        for rule in rules.iter().filter(|r| r.enabled) {
            let result = rule.kind.evaluate(facts);

            if let Some(metrics) = &self.metrics {
                metrics.record_rule_evaluation(result.findings.len());
            }

            for finding in result.findings {
                trace!(
                    policy_id = %rule.id,
                    rule_type = %rule.rule_type(),
                    severity = %finding.severity,
                    reason = %finding.reason,
                    "Rule triggered"
                );

                verdict.status = verdict.status.max(finding.severity);
                verdict.reasons.push(finding.reason);
                verdict
                    .policy_hits
                    .push(PolicyHit::new(rule.id.clone(), rule.rule_type()));
            }
        }

        verdict
    }

    /// Apply the caller's policy mode to a finished verdict.
    ///
    /// In advisory mode a rejection becomes pending with one extra reason.
    /// Called once, after every rule has run.
    pub fn apply_mode(&self, mut verdict: Verdict, mode: PolicyMode) -> Verdict {
        if mode == PolicyMode::Advisory && verdict.status.is_rejected() {
            verdict.status = Status::Pending;
            verdict.reasons.push(ADVISORY_DOWNGRADE_REASON.to_string());

            if let Some(metrics) = &self.metrics {
                metrics.record_advisory_downgrade();
            }
        }
        verdict
    }

    /// [`evaluate`](Self::evaluate) followed by [`apply_mode`](Self::apply_mode).
    pub fn evaluate_with_mode(
        &self,
        rules: &[PolicyRule],
        facts: &EvaluationFacts,
        mode: PolicyMode,
    ) -> Verdict {
        let verdict = self.evaluate(rules, facts);
        self.apply_mode(verdict, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyDefaults;
    use crate::domain::RuleType;
    use crate::policy::default_rules;
    use crate::rules::{
        BlocklistRule, CitationsRule, ConfidenceRule, GroundingRule, HumanReviewRule, MaxBiasRule,
        RuleKind,
    };

    fn facts() -> EvaluationFacts {
        EvaluationFacts {
            prompt: "What is the refund policy?".to_string(),
            answer: "Refunds are issued within 30 days.".to_string(),
            confidence: 0.9,
            bias_score: 0.0,
            sources_count: 3,
            consistency_score: 0.8,
            evidence_flags: vec![],
        }
    }

    fn rule(id: &str, kind: RuleKind) -> PolicyRule {
        PolicyRule::new(id, id, kind)
    }

    fn blocklist(id: &str, terms: &[&str]) -> PolicyRule {
        rule(
            id,
            RuleKind::BlocklistTerm(
                BlocklistRule::new(terms.iter().map(|t| t.to_string())).unwrap(),
            ),
        )
    }

    fn always_review(id: &str) -> PolicyRule {
        rule(
            id,
            RuleKind::RequireHumanReview(HumanReviewRule {
                always: true,
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_no_rules_approves() {
        let verdict = PolicyEvaluator::new().evaluate(&[], &facts());

        assert_eq!(verdict, Verdict::default());
        assert_eq!(verdict.status, Status::Approved);
    }

    #[test]
    fn test_no_triggered_rule_approves() {
        let rules = default_rules(&PolicyDefaults::default()).rules;

        let verdict = PolicyEvaluator::new().evaluate(&rules, &facts());

        assert_eq!(verdict.status, Status::Approved);
        assert!(verdict.reasons.is_empty());
        assert!(verdict.policy_hits.is_empty());
    }

    #[test]
    fn test_defaults_end_to_end() {
        let rules = default_rules(&PolicyDefaults::default()).rules;
        let facts = EvaluationFacts {
            confidence: 0.1,
            bias_score: 0.0,
            sources_count: 0,
            consistency_score: 0.5,
            evidence_flags: vec![],
            ..facts()
        };

        let verdict = PolicyEvaluator::new().evaluate(&rules, &facts);

        assert_eq!(verdict.status, Status::Pending);
        assert_eq!(
            verdict.reasons,
            vec!["Confidence below threshold 0.25", "Insufficient citations"]
        );
        assert_eq!(
            verdict.policy_hits,
            vec![
                PolicyHit::new("default-confidence", RuleType::RequireConfidence),
                PolicyHit::new("default-citations", RuleType::RequireCitations),
            ]
        );
    }

    #[test]
    fn test_blocklist_rejection_is_sticky() {
        let rules = vec![
            blocklist("block", &["refund"]),
            always_review("review"),
            rule("bias", RuleKind::MaxBias(MaxBiasRule { max_bias: -1.0 })),
        ];

        let verdict = PolicyEvaluator::new().evaluate(&rules, &facts());

        assert_eq!(verdict.status, Status::Rejected);
        assert_eq!(
            verdict.reasons,
            vec![
                "Blocked term detected",
                "Manual review required",
                "Bias score above limit"
            ]
        );
    }

    #[test]
    fn test_final_status_independent_of_rule_order() {
        let forward = vec![
            always_review("review"),
            blocklist("block", &["REFUND"]),
            rule("cite", RuleKind::RequireCitations(CitationsRule { min_sources: 10 })),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let evaluator = PolicyEvaluator::new();
        let a = evaluator.evaluate(&forward, &facts());
        let b = evaluator.evaluate(&reversed, &facts());

        assert_eq!(a.status, Status::Rejected);
        assert_eq!(a.status, b.status);
        // Reason order follows rule order
        assert_eq!(a.reasons.first().map(String::as_str), Some("Manual review required"));
        assert_eq!(b.reasons.first().map(String::as_str), Some("Insufficient citations"));
    }

    #[test]
    fn test_blocklist_is_case_insensitive() {
        let rules = vec![blocklist("block", &["foo"])];
        let facts = EvaluationFacts {
            answer: "this contains FOO somewhere".to_string(),
            ..facts()
        };

        let verdict = PolicyEvaluator::new().evaluate(&rules, &facts);

        assert_eq!(verdict.status, Status::Rejected);
        assert_eq!(
            verdict.policy_hits,
            vec![PolicyHit::new("block", RuleType::BlocklistTerm)]
        );
    }

    #[test]
    fn test_grounding_reports_both_findings() {
        let rules = vec![rule(
            "ground",
            RuleKind::RequireGrounding(GroundingRule {
                min_consistency: 0.9,
            }),
        )];
        let facts = EvaluationFacts {
            evidence_flags: vec!["unsupported_claim".to_string()],
            ..facts()
        };

        let verdict = PolicyEvaluator::new().evaluate(&rules, &facts);

        assert_eq!(verdict.status, Status::Pending);
        assert_eq!(
            verdict.reasons,
            vec![
                "Grounding consistency below 0.9",
                "Evidence alignment flags detected"
            ]
        );
        assert_eq!(verdict.policy_hits.len(), 2);
        assert!(verdict.policy_hits.iter().all(|h| h.policy_id == "ground"));
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let mut disabled = blocklist("block", &["refund"]);
        disabled.enabled = false;
        let rules = vec![
            disabled,
            rule(
                "conf",
                RuleKind::RequireConfidence(ConfidenceRule {
                    min_confidence: 0.95,
                }),
            ),
        ];

        let verdict = PolicyEvaluator::new().evaluate(&rules, &facts());

        assert_eq!(verdict.status, Status::Pending);
        assert_eq!(
            verdict.policy_hits,
            vec![PolicyHit::new("conf", RuleType::RequireConfidence)]
        );
    }

    #[test]
    fn test_advisory_downgrades_rejection_once() {
        let rules = vec![blocklist("a", &["refund"]), blocklist("b", &["days"])];

        let verdict = PolicyEvaluator::new().evaluate_with_mode(
            &rules,
            &facts(),
            PolicyMode::Advisory,
        );

        assert_eq!(verdict.status, Status::Pending);
        assert_eq!(
            verdict.reasons,
            vec![
                "Blocked term detected",
                "Blocked term detected",
                ADVISORY_DOWNGRADE_REASON
            ]
        );
        assert_eq!(verdict.policy_hits.len(), 2);
    }

    #[test]
    fn test_advisory_leaves_pending_alone() {
        let rules = vec![always_review("review")];

        let verdict =
            PolicyEvaluator::new().evaluate_with_mode(&rules, &facts(), PolicyMode::Advisory);

        assert_eq!(verdict.status, Status::Pending);
        assert_eq!(verdict.reasons, vec!["Manual review required"]);
    }

    #[test]
    fn test_enforce_keeps_rejection() {
        let rules = vec![blocklist("block", &["refund"])];

        let verdict =
            PolicyEvaluator::new().evaluate_with_mode(&rules, &facts(), PolicyMode::Enforce);

        assert_eq!(verdict.status, Status::Rejected);
        assert_eq!(verdict.reasons, vec!["Blocked term detected"]);
    }

    #[test]
    fn test_metrics_count_rules_and_hits() {
        let metrics = Arc::new(MetricsRegistry::new());
        let evaluator = PolicyEvaluator::with_metrics(metrics.clone());
        let rules = vec![blocklist("block", &["refund"]), always_review("review")];

        evaluator.evaluate_with_mode(&rules, &facts(), PolicyMode::Advisory);

        assert_eq!(metrics.sample("govai_rules_evaluated_total"), 2);
        assert_eq!(metrics.sample("govai_rule_hits_total"), 2);
        assert_eq!(metrics.sample("govai_advisory_downgrades_total"), 1);
    }
}
