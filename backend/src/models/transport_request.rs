//! Transportation request model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportStatus {
    Pending,
    Scheduled,
    Completed,
    Cancelled,
}

impl TransportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportStatus::Pending => "pending",
            TransportStatus::Scheduled => "scheduled",
            TransportStatus::Completed => "completed",
            TransportStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TransportRequest {
    pub id: i64,
    pub shelter: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub needed_at: DateTime<Utc>,
    pub pickup_location: String,
    pub destination: String,
    pub reason: Option<String>,
    pub resident_notes: Option<String>,
    pub callback_phone: Option<String>,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub scheduled_by: Option<i64>,
    pub driver_name: Option<String>,
    pub staff_notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<i64>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<i64>,
    pub cancel_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransportRequest {
    pub shelter: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub needed_at: DateTime<Utc>,
    pub pickup_location: String,
    pub destination: String,
    pub reason: Option<String>,
    pub resident_notes: Option<String>,
    pub callback_phone: Option<String>,
}
