pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod observability;
pub mod policy;
pub mod rules;
pub mod storage;

pub use config::Config;
pub use domain::{Decision, DecisionSummary, Evaluation, EvaluationFacts, Status};
pub use engine::{DriftMonitor, GovernanceService, PolicyEvaluator};
pub use error::GovernanceError;
pub use rules::{PolicyRule, Rule, RuleKind, RuleSet};
