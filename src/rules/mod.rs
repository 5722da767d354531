pub mod bias;
pub mod blocklist;
pub mod citations;
pub mod confidence;
pub mod grounding;
pub mod human_review;
pub mod traits;

pub use bias::MaxBiasRule;
pub use blocklist::BlocklistRule;
pub use citations::CitationsRule;
pub use confidence::ConfidenceRule;
pub use grounding::GroundingRule;
pub use human_review::HumanReviewRule;
pub use traits::Rule;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{EvaluationFacts, PolicyRecord, RuleResult, RuleType};
use crate::error::RuleParamError;

/// A rule kind together with its typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    RequireConfidence(ConfidenceRule),
    RequireCitations(CitationsRule),
    RequireGrounding(GroundingRule),
    BlocklistTerm(BlocklistRule),
    MaxBias(MaxBiasRule),
    RequireHumanReview(HumanReviewRule),
}

impl RuleKind {
    /// Compile a stored rule type and params object into a typed rule.
    ///
    /// Missing params fall back to each rule's defaults; params of the
    /// wrong type are a [`RuleParamError`].
    pub fn compile(rule_type: &str, params: &Value) -> Result<Self, RuleParamError> {
        let parsed: RuleType = rule_type
            .parse()
            .map_err(|e: crate::domain::policy::UnknownRuleType| {
                RuleParamError::new(rule_type, e.to_string())
            })?;

        let params = match params {
            Value::Null => Value::Object(serde_json::Map::new()),
            Value::Object(_) => params.clone(),
            other => {
                return Err(RuleParamError::new(
                    rule_type,
                    format!("params must be an object, got {other}"),
                ))
            }
        };

        let kind = match parsed {
            RuleType::RequireConfidence => RuleKind::RequireConfidence(parse(parsed, params)?),
            RuleType::RequireCitations => RuleKind::RequireCitations(parse(parsed, params)?),
            RuleType::RequireGrounding => RuleKind::RequireGrounding(parse(parsed, params)?),
            RuleType::BlocklistTerm => RuleKind::BlocklistTerm(
                BlocklistRule::from_params(params)
                    .map_err(|message| RuleParamError::new(parsed.as_str(), message))?,
            ),
            RuleType::MaxBias => RuleKind::MaxBias(parse(parsed, params)?),
            RuleType::RequireHumanReview => RuleKind::RequireHumanReview(parse(parsed, params)?),
        };

        Ok(kind)
    }

    fn as_rule(&self) -> &dyn Rule {
        match self {
            RuleKind::RequireConfidence(rule) => rule,
            RuleKind::RequireCitations(rule) => rule,
            RuleKind::RequireGrounding(rule) => rule,
            RuleKind::BlocklistTerm(rule) => rule,
            RuleKind::MaxBias(rule) => rule,
            RuleKind::RequireHumanReview(rule) => rule,
        }
    }
}

impl Rule for RuleKind {
    fn rule_type(&self) -> RuleType {
        self.as_rule().rule_type()
    }

    fn evaluate(&self, facts: &EvaluationFacts) -> RuleResult {
        self.as_rule().evaluate(facts)
    }
}

fn parse<T: DeserializeOwned>(rule_type: RuleType, params: Value) -> Result<T, RuleParamError> {
    serde_json::from_value(params).map_err(|e| RuleParamError::new(rule_type.as_str(), e.to_string()))
}

/// A compiled tenant policy.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyRule {
    pub id: String,
    pub name: String,
    pub kind: RuleKind,
    pub enabled: bool,
}

impl PolicyRule {
    /// Create an enabled rule.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: RuleKind) -> Self {
        PolicyRule {
            id: id.into(),
            name: name.into(),
            kind,
            enabled: true,
        }
    }

    pub fn from_record(record: &PolicyRecord) -> Result<Self, RuleParamError> {
        Ok(PolicyRule {
            id: record.id.clone(),
            name: record.name.clone(),
            kind: RuleKind::compile(&record.rule_type, &record.params)?,
            enabled: record.enabled,
        })
    }

    pub fn rule_type(&self) -> RuleType {
        self.kind.rule_type()
    }
}

/// Where a tenant's effective rules came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSource {
    /// Tenant-configured policies
    Custom,
    /// Built-in defaults, used when the tenant has none
    Defaults,
}

/// Ordered collection of compiled rules ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub rules: Vec<PolicyRule>,
    pub source: RuleSource,
}

impl RuleSet {
    /// Compile stored policies, keeping their order.
    ///
    /// Policies that fail to compile are returned separately so one bad row
    /// never blocks governance for the whole tenant.
    pub fn from_records(records: &[PolicyRecord]) -> (Self, Vec<(String, RuleParamError)>) {
        let mut rules = Vec::with_capacity(records.len());
        let mut errors = Vec::new();

        for record in records {
            match PolicyRule::from_record(record) {
                Ok(rule) => rules.push(rule),
                Err(e) => errors.push((record.id.clone(), e)),
            }
        }

        (
            RuleSet {
                rules,
                source: RuleSource::Custom,
            },
            errors,
        )
    }

    /// Number of rules that will actually run.
    pub fn enabled_count(&self) -> usize {
        self.rules.iter().filter(|r| r.enabled).count()
    }
}

/// Format a threshold the way it reads in a reason: always with a
/// fractional part, so `1` prints as `1.0` and `0.25` stays `0.25`.
/// Magnitudes below `1e-4` or from `1e16` up use a signed two-digit
/// exponent, e.g. `1e-05`.
pub fn format_threshold(value: f64) -> String {
    let magnitude = value.abs();
    if !value.is_finite() {
        format!("{value}")
    } else if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let scientific = format!("{value:e}");
        match scientific.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => scientific,
        }
    } else if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, rule_type: &str, params: Value) -> PolicyRecord {
        PolicyRecord {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            name: id.to_string(),
            rule_type: rule_type.to_string(),
            params,
            enabled: true,
        }
    }

    #[test]
    fn test_compile_each_rule_type() {
        let cases = [
            ("REQUIRE_CONFIDENCE", json!({"min_confidence": 0.4})),
            ("REQUIRE_CITATIONS", json!({"min_sources": 2})),
            ("REQUIRE_GROUNDING", json!({"min_consistency": 0.3})),
            ("BLOCKLIST_TERM", json!({"terms": ["x"]})),
            ("MAX_BIAS", json!({"max_bias": 0.2})),
            ("REQUIRE_HUMAN_REVIEW", json!({"always": true})),
        ];

        for (rule_type, params) in cases {
            let kind = RuleKind::compile(rule_type, &params).unwrap();
            assert_eq!(kind.rule_type().as_str(), rule_type);
        }
    }

    #[test]
    fn test_compile_typed_params() {
        let kind = RuleKind::compile("REQUIRE_CONFIDENCE", &json!({"min_confidence": 1})).unwrap();
        assert_eq!(
            kind,
            RuleKind::RequireConfidence(ConfidenceRule {
                min_confidence: 1.0
            })
        );
    }

    #[test]
    fn test_compile_null_params_uses_defaults() {
        let kind = RuleKind::compile("MAX_BIAS", &Value::Null).unwrap();
        assert_eq!(kind, RuleKind::MaxBias(MaxBiasRule { max_bias: 1.0 }));
    }

    #[test]
    fn test_compile_wrong_param_type() {
        let err =
            RuleKind::compile("REQUIRE_CONFIDENCE", &json!({"min_confidence": "high"})).unwrap_err();
        assert_eq!(err.rule_type, "REQUIRE_CONFIDENCE");
    }

    #[test]
    fn test_compile_unknown_rule_type() {
        let err = RuleKind::compile("NOPE", &json!({})).unwrap_err();
        assert!(err.message.contains("unknown rule type"));
    }

    #[test]
    fn test_compile_non_object_params() {
        assert!(RuleKind::compile("MAX_BIAS", &json!([1, 2])).is_err());
    }

    #[test]
    fn test_ruleset_from_records_keeps_order_and_skips_bad_rows() {
        let records = vec![
            record("p1", "MAX_BIAS", json!({"max_bias": 0.5})),
            record("p2", "REQUIRE_CONFIDENCE", json!({"min_confidence": "bad"})),
            record("p3", "BLOCKLIST_TERM", json!({"terms": ["x"]})),
        ];

        let (ruleset, errors) = RuleSet::from_records(&records);

        let ids: Vec<_> = ruleset.rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
        assert_eq!(ruleset.source, RuleSource::Custom);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "p2");
    }

    #[test]
    fn test_enabled_count() {
        let mut disabled = record("p2", "MAX_BIAS", json!({}));
        disabled.enabled = false;
        let records = vec![record("p1", "MAX_BIAS", json!({})), disabled];

        let (ruleset, _) = RuleSet::from_records(&records);
        assert_eq!(ruleset.enabled_count(), 1);
    }

    #[test]
    fn test_format_threshold() {
        assert_eq!(format_threshold(0.25), "0.25");
        assert_eq!(format_threshold(0.2), "0.2");
        assert_eq!(format_threshold(1.0), "1.0");
        assert_eq!(format_threshold(0.0), "0.0");
        assert_eq!(format_threshold(0.0001), "0.0001");
    }

    #[test]
    fn test_format_threshold_exponent_range() {
        assert_eq!(format_threshold(1e-5), "1e-05");
        assert_eq!(format_threshold(2.5e-7), "2.5e-07");
        assert_eq!(format_threshold(1e16), "1e+16");
        assert_eq!(format_threshold(1.5e300), "1.5e+300");
        assert_eq!(format_threshold(1e15), "1000000000000000.0");
    }

    #[test]
    fn test_compile_whole_float_min_sources() {
        let kind = RuleKind::compile("REQUIRE_CITATIONS", &json!({"min_sources": 2.0})).unwrap();

        assert_eq!(kind, RuleKind::RequireCitations(CitationsRule { min_sources: 2 }));
    }
}
