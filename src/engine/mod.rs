//! Evaluation, recording, review and drift detection.

pub mod drift;
pub mod evaluator;
pub mod recorder;
pub mod service;

pub use drift::{DriftMeasurement, DriftMonitor, DriftReport};
pub use evaluator::{PolicyEvaluator, ADVISORY_DOWNGRADE_REASON};
pub use recorder::AuditRecorder;
pub use service::{GovernanceService, ReviewRequest};
