use serde::{Deserialize, Serialize};

use crate::domain::{EvaluationFacts, RuleResult, RuleType};
use crate::rules::format_threshold;
use crate::rules::traits::Rule;

/// Holds answers whose generation confidence is below a floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceRule {
    #[serde(default)]
    pub min_confidence: f64,
}

impl Rule for ConfidenceRule {
    fn rule_type(&self) -> RuleType {
        RuleType::RequireConfidence
    }

    fn evaluate(&self, facts: &EvaluationFacts) -> RuleResult {
        RuleResult::pass().escalate_if(
            facts.confidence < self.min_confidence,
            format!(
                "Confidence below threshold {}",
                format_threshold(self.min_confidence)
            ),
        )
    }
}
