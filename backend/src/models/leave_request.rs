//! Leave request model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a leave request: pending, then approved or denied; an
/// approved leave ends when the resident is checked back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Denied,
    CheckedIn,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Denied => "denied",
            LeaveStatus::CheckedIn => "checked_in",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeaveRequest {
    pub id: i64,
    pub shelter: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub destination: String,
    pub reason: Option<String>,
    pub resident_notes: Option<String>,
    pub resident_phone: Option<String>,
    pub leave_at: DateTime<Utc>,
    pub return_at: DateTime<Utc>,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<i64>,
    pub decision_note: Option<String>,
    pub check_in_at: Option<DateTime<Utc>>,
    pub check_in_by: Option<i64>,
}

/// A validated leave submission ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub shelter: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub destination: String,
    pub reason: Option<String>,
    pub resident_notes: Option<String>,
    pub resident_phone: Option<String>,
    pub leave_at: DateTime<Utc>,
    pub return_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_match_stored_values() {
        assert_eq!(LeaveStatus::Pending.as_str(), "pending");
        assert_eq!(LeaveStatus::CheckedIn.as_str(), "checked_in");
        assert_eq!(
            serde_json::to_value(LeaveStatus::CheckedIn).unwrap(),
            serde_json::json!("checked_in")
        );
    }
}
