//! Attendance events and the per-resident board derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceEventType {
    CheckIn,
    CheckOut,
}

impl AttendanceEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceEventType::CheckIn => "check_in",
            AttendanceEventType::CheckOut => "check_out",
        }
    }
}

/// One row of the attendance board: an active resident joined with the
/// latest attendance event recorded for them in the shelter, if any.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRow {
    pub resident_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub event_type: Option<String>,
    pub event_time: Option<DateTime<Utc>>,
    pub expected_back_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceStatus {
    pub resident_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub status: String,
    pub time: Option<DateTime<Utc>>,
    pub expected_back_time: Option<DateTime<Utc>>,
    pub is_overdue: bool,
}

impl AttendanceStatus {
    /// Residents without any event count as checked in. A resident is overdue
    /// only while checked out past their expected-back time.
    pub fn from_row(row: AttendanceRow, now: DateTime<Utc>) -> Self {
        let status = row
            .event_type
            .unwrap_or_else(|| AttendanceEventType::CheckIn.as_str().to_string());
        let is_overdue = status == AttendanceEventType::CheckOut.as_str()
            && row.expected_back_time.is_some_and(|eb| eb < now);

        Self {
            resident_id: row.resident_id,
            first_name: row.first_name,
            last_name: row.last_name,
            dob: row.dob,
            status,
            time: row.event_time,
            expected_back_time: row.expected_back_time,
            is_overdue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(event: Option<&str>, expected_back: Option<DateTime<Utc>>) -> AttendanceRow {
        AttendanceRow {
            resident_id: 7,
            first_name: "Ana".into(),
            last_name: "Reyes".into(),
            dob: "1990-01-01".into(),
            event_type: event.map(str::to_string),
            event_time: event.map(|_| Utc::now()),
            expected_back_time: expected_back,
        }
    }

    #[test]
    fn test_no_events_defaults_to_checked_in() {
        let status = AttendanceStatus::from_row(row(None, None), Utc::now());
        assert_eq!(status.status, "check_in");
        assert!(status.time.is_none());
        assert!(!status.is_overdue);
    }

    #[test]
    fn test_checked_out_past_expected_back_is_overdue() {
        let now = Utc::now();
        let status =
            AttendanceStatus::from_row(row(Some("check_out"), Some(now - Duration::hours(1))), now);
        assert!(status.is_overdue);
    }

    #[test]
    fn test_checked_out_before_expected_back_is_not_overdue() {
        let now = Utc::now();
        let status =
            AttendanceStatus::from_row(row(Some("check_out"), Some(now + Duration::hours(1))), now);
        assert!(!status.is_overdue);
    }

    #[test]
    fn test_checked_out_without_expected_back_is_not_overdue() {
        let status = AttendanceStatus::from_row(row(Some("check_out"), None), Utc::now());
        assert_eq!(status.status, "check_out");
        assert!(!status.is_overdue);
    }

    #[test]
    fn test_checked_in_ignores_stale_expected_back() {
        let now = Utc::now();
        let status =
            AttendanceStatus::from_row(row(Some("check_in"), Some(now - Duration::days(2))), now);
        assert!(!status.is_overdue);
    }
}
