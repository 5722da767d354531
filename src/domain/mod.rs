pub mod decision;
pub mod evidence;
pub mod facts;
pub mod policy;
pub mod status;

pub use decision::{
    AuditLog, Decision, DecisionSummary, EvaluationRecord, Review, ReviewOutcome, Verdict,
};
pub use evidence::{Finding, PolicyHit, RuleResult};
pub use facts::{Evaluation, EvaluationFacts};
pub use policy::{PolicyRecord, RuleType};
pub use status::{PolicyMode, Status};
