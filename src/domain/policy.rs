use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// Minimum generation confidence
    RequireConfidence,
    /// Minimum number of cited sources
    RequireCitations,
    /// Minimum grounding consistency, plus evidence alignment flags
    RequireGrounding,
    /// Case-insensitive blocked substrings
    BlocklistTerm,
    /// Maximum bias score
    MaxBias,
    /// Unconditional or threshold-based manual review
    RequireHumanReview,
}

impl RuleType {
    pub const ALL: [RuleType; 6] = [
        RuleType::RequireConfidence,
        RuleType::RequireCitations,
        RuleType::RequireGrounding,
        RuleType::BlocklistTerm,
        RuleType::MaxBias,
        RuleType::RequireHumanReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::RequireConfidence => "REQUIRE_CONFIDENCE",
            RuleType::RequireCitations => "REQUIRE_CITATIONS",
            RuleType::RequireGrounding => "REQUIRE_GROUNDING",
            RuleType::BlocklistTerm => "BLOCKLIST_TERM",
            RuleType::MaxBias => "MAX_BIAS",
            RuleType::RequireHumanReview => "REQUIRE_HUMAN_REVIEW",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known rule type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rule type '{0}'")]
pub struct UnknownRuleType(pub String);

impl FromStr for RuleType {
    type Err = UnknownRuleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownRuleType(s.to_string()))
    }
}

/// A tenant policy as stored.
///
/// `rule_type` and `params` are kept in their raw stored form; they are
/// compiled into a typed rule when the policy is created and again each
/// time the tenant's rules are resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub rule_type: String,
    pub params: serde_json::Value,
    pub enabled: bool,
}
