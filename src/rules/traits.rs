use crate::domain::{EvaluationFacts, RuleResult, RuleType};
use std::fmt::Debug;

/// A stateless governance check.
///
/// Rules are evaluated synchronously against the facts of one answer and
/// have no access to historical data. A rule may report more than one
/// finding; the evaluator keeps them in the order reported.
pub trait Rule: Send + Sync + Debug {
    /// Kind of rule, recorded in policy hits.
    fn rule_type(&self) -> RuleType;

    /// Evaluate the rule against the facts of one answer.
    fn evaluate(&self, facts: &EvaluationFacts) -> RuleResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AlwaysHold;

    impl Rule for AlwaysHold {
        fn rule_type(&self) -> RuleType {
            RuleType::RequireHumanReview
        }

        fn evaluate(&self, _facts: &EvaluationFacts) -> RuleResult {
            RuleResult::pass().escalate("held")
        }
    }

    #[test]
    fn test_rule_trait_object() {
        let rule: Box<dyn Rule> = Box::new(AlwaysHold);

        assert_eq!(rule.rule_type(), RuleType::RequireHumanReview);
        assert!(rule.evaluate(&EvaluationFacts::default()).hit());
    }
}
