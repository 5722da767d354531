// src/storage/mock.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::domain::{
    AuditLog, Decision, EvaluationRecord, PolicyRecord, Review, ReviewOutcome, Status,
};

use super::traits::{AuditRepository, DecisionRepository, PolicyRepository};

#[derive(Debug, Default)]
struct Tables {
    next_seq: i64,
    policies: Vec<PolicyRecord>,
    audits: Vec<(i64, AuditLog)>,
    decisions: Vec<(i64, Decision)>,
}

impl Tables {
    fn next_seq(&mut self) -> i64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// In-memory storage for tests and benchmarks.
///
/// All tables live behind one lock, so an audit row and its decision
/// become visible together.
#[derive(Debug, Default)]
pub struct MockStorage {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent evaluation writes fail (for testing).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Insert an audit row directly with the given bias score (for testing).
    pub fn push_audit(&self, tenant_id: &str, bias_score: f64, created_at: DateTime<Utc>) {
        let mut tables = self.tables.lock();
        let seq = tables.next_seq();
        tables.audits.push((
            seq,
            AuditLog {
                id: Uuid::new_v4(),
                tenant_id: tenant_id.to_string(),
                user_id: "seed".to_string(),
                prompt: String::new(),
                answer: String::new(),
                confidence: 1.0,
                bias_score,
                model_id: "seed".to_string(),
                decision_status: Status::Approved,
                created_at,
            },
        ));
    }

    /// Number of audit rows (for assertions).
    pub fn audit_count(&self) -> usize {
        self.tables.lock().audits.len()
    }

    /// Number of decision rows (for assertions).
    pub fn decision_count(&self) -> usize {
        self.tables.lock().decisions.len()
    }
}

#[async_trait]
impl PolicyRepository for MockStorage {
    async fn create_policy(&self, policy: &PolicyRecord) -> anyhow::Result<()> {
        self.tables.lock().policies.push(policy.clone());
        Ok(())
    }

    async fn list_policies(&self, tenant_id: &str) -> anyhow::Result<Vec<PolicyRecord>> {
        Ok(self
            .tables
            .lock()
            .policies
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DecisionRepository for MockStorage {
    async fn record_evaluation(&self, record: &EvaluationRecord) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("injected write failure");
        }

        let mut tables = self.tables.lock();
        if tables.decisions.iter().any(|(_, d)| d.audit_id == record.audit.id) {
            anyhow::bail!("audit {} already has a decision", record.audit.id);
        }

        let audit_seq = tables.next_seq();
        let decision_seq = tables.next_seq();
        tables.audits.push((audit_seq, record.audit.clone()));
        tables.decisions.push((decision_seq, record.decision.clone()));

        Ok(())
    }

    async fn list_decisions(
        &self,
        tenant_id: &str,
        status: Option<Status>,
        limit: i64,
    ) -> anyhow::Result<Vec<Decision>> {
        let tables = self.tables.lock();
        let mut matching: Vec<_> = tables
            .decisions
            .iter()
            .filter(|(_, d)| d.tenant_id == tenant_id)
            .filter(|(_, d)| status.map_or(true, |s| d.status == s))
            .collect();

        matching.sort_by(|(a_seq, a), (b_seq, b)| {
            (b.created_at, b_seq).cmp(&(a.created_at, a_seq))
        });

        Ok(matching
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn decision_detail(
        &self,
        decision_id: Uuid,
    ) -> anyhow::Result<Option<(Decision, AuditLog)>> {
        let tables = self.tables.lock();
        let Some((_, decision)) = tables.decisions.iter().find(|(_, d)| d.id == decision_id) else {
            return Ok(None);
        };

        let audit = tables
            .audits
            .iter()
            .find(|(_, a)| a.id == decision.audit_id)
            .map(|(_, a)| a.clone())
            .ok_or_else(|| anyhow::anyhow!("decision {decision_id} has no audit row"))?;

        Ok(Some((decision.clone(), audit)))
    }

    async fn review_decision(
        &self,
        decision_id: Uuid,
        review: &Review,
    ) -> anyhow::Result<ReviewOutcome> {
        let mut tables = self.tables.lock();
        let Some((_, decision)) = tables.decisions.iter_mut().find(|(_, d)| d.id == decision_id)
        else {
            return Ok(ReviewOutcome::NotFound);
        };

        if let Some(expected) = review.expected_version {
            if expected != decision.version {
                return Ok(ReviewOutcome::Conflict {
                    current_version: decision.version,
                });
            }
        }

        decision.status = review.status;
        decision.reviewer = Some(review.reviewer.clone());
        decision.review_notes = Some(review.notes.clone());
        decision.updated_at = review.reviewed_at;
        decision.version += 1;

        Ok(ReviewOutcome::Updated {
            version: decision.version,
        })
    }
}

#[async_trait]
impl AuditRepository for MockStorage {
    async fn recent_bias_scores(&self, tenant_id: &str, limit: i64) -> anyhow::Result<Vec<f64>> {
        let tables = self.tables.lock();
        let mut matching: Vec<_> = tables
            .audits
            .iter()
            .filter(|(_, a)| a.tenant_id == tenant_id)
            .collect();

        matching.sort_by(|(a_seq, a), (b_seq, b)| {
            (b.created_at, b_seq).cmp(&(a.created_at, a_seq))
        });

        Ok(matching
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|(_, a)| a.bias_score)
            .collect())
    }
}
