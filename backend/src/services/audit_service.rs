//! Audit trail of resident submissions and staff actions.

use serde::Deserialize;
use sqlx::{PgExecutor, PgPool};

use crate::error::{AppError, Result};
use crate::models::audit_log::AuditEntry;

/// Entity kinds recorded in the audit log.
pub mod entity {
    pub const LEAVE: &str = "leave";
    pub const TRANSPORT: &str = "transport";
    pub const STAFF: &str = "staff";
    pub const RESIDENT: &str = "resident";
    pub const ATTENDANCE: &str = "attendance";
}

/// One audit record to write.
#[derive(Debug, Clone)]
pub struct AuditRecord<'a> {
    pub entity_type: &'a str,
    pub entity_id: Option<i64>,
    pub shelter: Option<&'a str>,
    pub staff_user_id: Option<i64>,
    pub action_type: &'a str,
    pub details: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub entity_type: Option<String>,
    pub shelter: Option<String>,
    pub limit: Option<i64>,
}

impl AuditQuery {
    pub fn bounded_limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }
}

pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn record(&self, record: AuditRecord<'_>) -> Result<()> {
        record_with(&self.db, record).await
    }

    /// Most recent entries first.
    pub async fn list(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let entries: Vec<AuditEntry> = sqlx::query_as(
            r#"
            SELECT id, entity_type, entity_id, shelter, staff_user_id,
                   action_type, action_details, created_at
            FROM audit_log
            WHERE ($1::text IS NULL OR entity_type = $1)
              AND ($2::text IS NULL OR shelter = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(query.entity_type.as_deref())
        .bind(query.shelter.as_deref())
        .bind(query.bounded_limit())
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(entries)
    }
}

/// Write an audit record on any executor, so callers inside a transaction
/// commit the record together with the change it describes.
pub async fn record_with<'e, E>(executor: E, record: AuditRecord<'_>) -> Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO audit_log
            (entity_type, entity_id, shelter, staff_user_id, action_type, action_details, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, date_trunc('second', NOW()))
        "#,
    )
    .bind(record.entity_type)
    .bind(record.entity_id)
    .bind(record.shelter)
    .bind(record.staff_user_id)
    .bind(record.action_type)
    .bind(record.details)
    .execute(executor)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_to_100() {
        assert_eq!(AuditQuery::default().bounded_limit(), 100);
    }

    #[test]
    fn test_limit_is_clamped() {
        let high = AuditQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(high.bounded_limit(), 500);

        let low = AuditQuery {
            limit: Some(-3),
            ..Default::default()
        };
        assert_eq!(low.bounded_limit(), 1);
    }
}
