// src/storage/postgres.rs
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    AuditLog, Decision, EvaluationRecord, PolicyHit, PolicyRecord, Review, ReviewOutcome, Status,
};

use super::traits::{AuditRepository, DecisionRepository, PolicyRepository};

/// Connection pool sizing and the per-attempt connect timeout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolSettings {
    pub min_connections: u32,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings {
            min_connections: 1,
            max_connections: 10,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// PostgreSQL implementation of the repository traits.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Create a new PostgresStorage instance with a connection pool.
    ///
    /// Fails once `connect_timeout` passes without an open connection.
    pub async fn connect(database_url: &str, settings: PoolSettings) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(settings.min_connections)
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Connect and migrate, retrying a bounded number of times with a fixed delay.
    ///
    /// Returns the last error once `attempts` are exhausted.
    pub async fn connect_with_retry(
        database_url: &str,
        settings: PoolSettings,
        attempts: u32,
        delay: Duration,
    ) -> anyhow::Result<Self> {
        let attempts = attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let result = async {
                let storage = Self::connect(database_url, settings).await?;
                storage.run_migrations().await?;
                anyhow::Ok(storage)
            }
            .await;

            match result {
                Ok(storage) => {
                    info!(attempt, "Database ready");
                    return Ok(storage);
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "Database not reachable yet");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("no connection attempt made"))
            .context(format!("database unreachable after {attempts} attempts")))
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_status(raw: &str) -> anyhow::Result<Status> {
    raw.parse()
        .with_context(|| format!("corrupt status column: {raw}"))
}

fn decision_from_row(row: &PgRow) -> anyhow::Result<Decision> {
    let status: String = row.try_get("status")?;
    let Json(reasons): Json<Vec<String>> = row.try_get("reasons")?;
    let Json(policy_hits): Json<Vec<PolicyHit>> = row.try_get("policy_hits")?;

    Ok(Decision {
        id: row.try_get("id")?,
        audit_id: row.try_get("audit_id")?,
        tenant_id: row.try_get("tenant_id")?,
        status: parse_status(&status)?,
        reasons,
        policy_hits,
        reviewer: row.try_get("reviewer")?,
        review_notes: row.try_get("review_notes")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn audit_from_row(row: &PgRow) -> anyhow::Result<AuditLog> {
    let status: String = row.try_get("a_decision_status")?;

    Ok(AuditLog {
        id: row.try_get("a_id")?,
        tenant_id: row.try_get("a_tenant_id")?,
        user_id: row.try_get("a_user_id")?,
        prompt: row.try_get("a_prompt")?,
        answer: row.try_get("a_answer")?,
        confidence: row.try_get("a_confidence")?,
        bias_score: row.try_get("a_bias_score")?,
        model_id: row.try_get("a_model_id")?,
        decision_status: parse_status(&status)?,
        created_at: row.try_get("a_created_at")?,
    })
}

#[async_trait]
impl PolicyRepository for PostgresStorage {
    async fn create_policy(&self, policy: &PolicyRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO policy_rules (id, tenant_id, name, rule_type, params, enabled)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&policy.id)
        .bind(&policy.tenant_id)
        .bind(&policy.name)
        .bind(&policy.rule_type)
        .bind(&policy.params)
        .bind(policy.enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_policies(&self, tenant_id: &str) -> anyhow::Result<Vec<PolicyRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, name, rule_type, params, enabled
            FROM policy_rules
            WHERE tenant_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> anyhow::Result<PolicyRecord> {
                Ok(PolicyRecord {
                    id: row.try_get("id")?,
                    tenant_id: row.try_get("tenant_id")?,
                    name: row.try_get("name")?,
                    rule_type: row.try_get("rule_type")?,
                    params: row.try_get("params")?,
                    enabled: row.try_get("enabled")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl DecisionRepository for PostgresStorage {
    async fn record_evaluation(&self, record: &EvaluationRecord) -> anyhow::Result<()> {
        let audit = &record.audit;
        let decision = &record.decision;

        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, tenant_id, user_id, prompt, answer,
                confidence, bias_score, model_id, decision_status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(audit.id)
        .bind(&audit.tenant_id)
        .bind(&audit.user_id)
        .bind(&audit.prompt)
        .bind(&audit.answer)
        .bind(audit.confidence)
        .bind(audit.bias_score)
        .bind(&audit.model_id)
        .bind(audit.decision_status.as_str())
        .bind(audit.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO decisions (
                id, audit_id, tenant_id, status, reasons, policy_hits,
                reviewer, review_notes, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(decision.id)
        .bind(decision.audit_id)
        .bind(&decision.tenant_id)
        .bind(decision.status.as_str())
        .bind(Json(&decision.reasons))
        .bind(Json(&decision.policy_hits))
        .bind(&decision.reviewer)
        .bind(&decision.review_notes)
        .bind(decision.version)
        .bind(decision.created_at)
        .bind(decision.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn list_decisions(
        &self,
        tenant_id: &str,
        status: Option<Status>,
        limit: i64,
    ) -> anyhow::Result<Vec<Decision>> {
        let rows = sqlx::query(
            r#"
            SELECT id, audit_id, tenant_id, status, reasons, policy_hits,
                   reviewer, review_notes, version, created_at, updated_at
            FROM decisions
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC, seq DESC
            LIMIT $3
            "#,
        )
        .bind(tenant_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decision_from_row).collect()
    }

    async fn decision_detail(
        &self,
        decision_id: Uuid,
    ) -> anyhow::Result<Option<(Decision, AuditLog)>> {
        let row = sqlx::query(
            r#"
            SELECT d.id, d.audit_id, d.tenant_id, d.status, d.reasons, d.policy_hits,
                   d.reviewer, d.review_notes, d.version, d.created_at, d.updated_at,
                   a.id AS a_id,
                   a.tenant_id AS a_tenant_id,
                   a.user_id AS a_user_id,
                   a.prompt AS a_prompt,
                   a.answer AS a_answer,
                   a.confidence AS a_confidence,
                   a.bias_score AS a_bias_score,
                   a.model_id AS a_model_id,
                   a.decision_status AS a_decision_status,
                   a.created_at AS a_created_at
            FROM decisions d
            JOIN audit_logs a ON a.id = d.audit_id
            WHERE d.id = $1
            "#,
        )
        .bind(decision_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some((decision_from_row(&row)?, audit_from_row(&row)?)))
    }

    async fn review_decision(
        &self,
        decision_id: Uuid,
        review: &Review,
    ) -> anyhow::Result<ReviewOutcome> {
        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE decisions
            SET status = $2,
                reviewer = $3,
                review_notes = $4,
                updated_at = $5,
                version = version + 1
            WHERE id = $1
              AND ($6::int IS NULL OR version = $6)
            RETURNING version
            "#,
        )
        .bind(decision_id)
        .bind(review.status.as_str())
        .bind(&review.reviewer)
        .bind(&review.notes)
        .bind(review.reviewed_at)
        .bind(review.expected_version)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(version) = updated {
            return Ok(ReviewOutcome::Updated { version });
        }

        let current: Option<i32> =
            sqlx::query_scalar("SELECT version FROM decisions WHERE id = $1")
                .bind(decision_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match current {
            Some(current_version) => ReviewOutcome::Conflict { current_version },
            None => ReviewOutcome::NotFound,
        })
    }
}

#[async_trait]
impl AuditRepository for PostgresStorage {
    async fn recent_bias_scores(&self, tenant_id: &str, limit: i64) -> anyhow::Result<Vec<f64>> {
        let scores = sqlx::query_scalar(
            r#"
            SELECT bias_score
            FROM audit_logs
            WHERE tenant_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(scores)
    }
}
