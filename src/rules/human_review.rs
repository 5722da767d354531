use serde::{Deserialize, Serialize};

use crate::domain::{EvaluationFacts, RuleResult, RuleType};
use crate::rules::traits::Rule;

fn default_if_bias_over() -> f64 {
    1.1
}

fn default_if_confidence_below() -> f64 {
    -1.0
}

/// Routes answers to a human reviewer.
///
/// With `always` set every answer is held. Otherwise the bias and
/// confidence thresholds are checked independently; the defaults are
/// outside the usual score range so an unset threshold never fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanReviewRule {
    #[serde(default)]
    pub always: bool,

    #[serde(default = "default_if_bias_over")]
    pub if_bias_over: f64,

    #[serde(default = "default_if_confidence_below")]
    pub if_confidence_below: f64,
}

impl Default for HumanReviewRule {
    fn default() -> Self {
        HumanReviewRule {
            always: false,
            if_bias_over: default_if_bias_over(),
            if_confidence_below: default_if_confidence_below(),
        }
    }
}

impl Rule for HumanReviewRule {
    fn rule_type(&self) -> RuleType {
        RuleType::RequireHumanReview
    }

    fn evaluate(&self, facts: &EvaluationFacts) -> RuleResult {
        if self.always {
            return RuleResult::pass().escalate("Manual review required");
        }

        RuleResult::pass()
            .escalate_if(
                facts.bias_score > self.if_bias_over,
                "Manual review due to bias",
            )
            .escalate_if(
                facts.confidence < self.if_confidence_below,
                "Manual review due to low confidence",
            )
    }
}
