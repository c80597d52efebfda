//! Audit log model.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub shelter: Option<String>,
    pub staff_user_id: Option<i64>,
    pub action_type: String,
    pub action_details: Option<String>,
    pub created_at: DateTime<Utc>,
}
