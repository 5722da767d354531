use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{EvaluationFacts, RuleResult, RuleType};
use crate::rules::traits::Rule;

fn default_min_sources() -> i64 {
    1
}

/// Whole numbers written as floats (`2.0`) count too.
fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Int(i64),
        Float(f64),
    }

    match Count::deserialize(deserializer)? {
        Count::Int(n) => Ok(n),
        Count::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
        Count::Float(f) => Err(D::Error::custom(format!(
            "min_sources must be a whole number, got {f}"
        ))),
    }
}

/// Holds answers that cite fewer sources than required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationsRule {
    #[serde(default = "default_min_sources", deserialize_with = "whole_number")]
    pub min_sources: i64,
}

impl Rule for CitationsRule {
    fn rule_type(&self) -> RuleType {
        RuleType::RequireCitations
    }

    fn evaluate(&self, facts: &EvaluationFacts) -> RuleResult {
        let sources = i64::try_from(facts.sources_count).unwrap_or(i64::MAX);
        RuleResult::pass().escalate_if(sources < self.min_sources, "Insufficient citations")
    }
}
