use serde::Deserialize;

use crate::domain::{EvaluationFacts, RuleResult, RuleType};
use crate::rules::traits::Rule;

#[derive(Debug, Deserialize)]
struct BlocklistParams {
    #[serde(default)]
    terms: Vec<String>,
}

/// Rejects answers whose prompt or text contains a blocked term.
///
/// Terms are matched as case-insensitive substrings of the prompt and
/// answer joined by a newline. A match rejects unconditionally.
#[derive(Debug, Clone, PartialEq)]
pub struct BlocklistRule {
    /// Lowercased, non-blank terms
    terms: Vec<String>,
}

impl BlocklistRule {
    /// Create a blocklist rule, normalizing terms to lowercase.
    ///
    /// Blank terms are refused: an empty substring would match every answer.
    pub fn new<I, S>(terms: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for term in terms {
            let term = term.as_ref();
            if term.trim().is_empty() {
                return Err("blocklist terms must not be blank".to_string());
            }
            normalized.push(term.to_lowercase());
        }
        Ok(BlocklistRule { terms: normalized })
    }

    pub(crate) fn from_params(params: serde_json::Value) -> Result<Self, String> {
        let params: BlocklistParams =
            serde_json::from_value(params).map_err(|e| e.to_string())?;
        BlocklistRule::new(params.terms)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl Rule for BlocklistRule {
    fn rule_type(&self) -> RuleType {
        RuleType::BlocklistTerm
    }

    fn evaluate(&self, facts: &EvaluationFacts) -> RuleResult {
        if self.terms.is_empty() {
            return RuleResult::pass();
        }

        let text = facts.searchable_text();
        if self.terms.iter().any(|term| text.contains(term.as_str())) {
            return RuleResult::pass().reject("Blocked term detected");
        }

        RuleResult::pass()
    }
}
