use serde::{Deserialize, Serialize};

use crate::domain::{EvaluationFacts, RuleResult, RuleType};
use crate::rules::traits::Rule;

fn default_max_bias() -> f64 {
    1.0
}

/// Holds answers whose bias score exceeds a ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxBiasRule {
    #[serde(default = "default_max_bias")]
    pub max_bias: f64,
}

impl Rule for MaxBiasRule {
    fn rule_type(&self) -> RuleType {
        RuleType::MaxBias
    }

    fn evaluate(&self, facts: &EvaluationFacts) -> RuleResult {
        RuleResult::pass().escalate_if(facts.bias_score > self.max_bias, "Bias score above limit")
    }
}
