use serde::{Deserialize, Serialize};

use crate::domain::{EvaluationFacts, RuleResult, RuleType};
use crate::rules::format_threshold;
use crate::rules::traits::Rule;

/// Holds answers that are poorly grounded in their sources.
///
/// Two independent checks: the consistency score against a floor, and
/// the presence of any evidence alignment flag. Both may fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingRule {
    #[serde(default)]
    pub min_consistency: f64,
}

impl Rule for GroundingRule {
    fn rule_type(&self) -> RuleType {
        RuleType::RequireGrounding
    }

    fn evaluate(&self, facts: &EvaluationFacts) -> RuleResult {
        RuleResult::pass()
            .escalate_if(
                facts.consistency_score < self.min_consistency,
                format!(
                    "Grounding consistency below {}",
                    format_threshold(self.min_consistency)
                ),
            )
            .escalate_if(
                !facts.evidence_flags.is_empty(),
                "Evidence alignment flags detected",
            )
    }
}
