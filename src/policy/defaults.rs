use crate::config::PolicyDefaults;
use crate::rules::{
    CitationsRule, ConfidenceRule, GroundingRule, PolicyRule, RuleKind, RuleSet, RuleSource,
};

/// Consistency floor of the default grounding rule.
pub const DEFAULT_MIN_CONSISTENCY: f64 = 0.2;

/// Built-in rules for a tenant that has configured none.
///
/// These are synthesized on every resolve and never persisted.
pub fn default_rules(defaults: &PolicyDefaults) -> RuleSet {
    let mut rules = vec![
        PolicyRule::new(
            "default-confidence",
            "Minimum Confidence",
            RuleKind::RequireConfidence(ConfidenceRule {
                min_confidence: defaults.default_confidence,
            }),
        ),
        PolicyRule::new(
            "default-grounding",
            "Minimum Grounding Consistency",
            RuleKind::RequireGrounding(GroundingRule {
                min_consistency: DEFAULT_MIN_CONSISTENCY,
            }),
        ),
    ];

    if defaults.require_citations {
        rules.push(PolicyRule::new(
            "default-citations",
            "Require Citations",
            RuleKind::RequireCitations(CitationsRule { min_sources: 1 }),
        ));
    }

    RuleSet {
        rules,
        source: RuleSource::Defaults,
    }
}
