// src/storage/mod.rs
pub mod mock;
pub mod postgres;
pub mod traits;

pub use mock::MockStorage;
pub use postgres::{PoolSettings, PostgresStorage};
pub use traits::{AuditRepository, DecisionRepository, PolicyRepository};

use std::sync::Arc;

/// Repository handles injected into the governance components.
#[derive(Clone)]
pub struct Repositories {
    pub policies: Arc<dyn PolicyRepository>,
    pub decisions: Arc<dyn DecisionRepository>,
    pub audits: Arc<dyn AuditRepository>,
}

impl Repositories {
    /// Use one backend for every repository.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: PolicyRepository + DecisionRepository + AuditRepository + 'static,
    {
        Repositories {
            policies: backend.clone(),
            decisions: backend.clone(),
            audits: backend,
        }
    }
}
