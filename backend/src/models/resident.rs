//! Resident model.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Resident {
    pub id: i64,
    pub shelter: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
