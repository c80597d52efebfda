//! Resident transportation requests and their scheduling by staff.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::PgPool;

use crate::api::validation::{all_present, field, optional_field, parse_datetime, require_shelter};
use crate::error::{AppError, Result};
use crate::models::transport_request::{NewTransportRequest, TransportRequest, TransportStatus};
use crate::services::audit_service::{self, entity, AuditRecord};
use crate::services::metrics_service;

const TRANSPORT_COLUMNS: &str = r#"
    id, shelter, first_name, last_name, dob, needed_at, pickup_location, destination,
    reason, resident_notes, callback_phone, status, submitted_at, scheduled_at,
    scheduled_by, driver_name, staff_notes, completed_at, completed_by, cancelled_at,
    cancelled_by, cancel_reason
"#;

/// Grace period for a `needed_at` that is slightly in the past by the time
/// the form reaches the server.
const PAST_GRACE_MINUTES: i64 = 1;

#[derive(Debug, Default, Deserialize)]
pub struct TransportSubmission {
    pub shelter: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub needed_at: Option<String>,
    pub pickup_location: Option<String>,
    pub destination: Option<String>,
    pub reason: Option<String>,
    pub resident_notes: Option<String>,
    pub callback_phone: Option<String>,
}

impl TransportSubmission {
    pub fn validate(&self, shelters: &[String], now: DateTime<Utc>) -> Result<NewTransportRequest> {
        let shelter = field(&self.shelter);
        require_shelter(shelters, &shelter)?;

        let first_name = field(&self.first_name);
        let last_name = field(&self.last_name);
        let dob = field(&self.dob);
        let needed_raw = field(&self.needed_at);
        let pickup_location = field(&self.pickup_location);
        let destination = field(&self.destination);

        let mut errors = Vec::new();
        if !all_present(&[
            &first_name,
            &last_name,
            &dob,
            &needed_raw,
            &pickup_location,
            &destination,
        ]) {
            errors.push("Complete all required fields.".to_string());
        }

        let needed_at = parse_datetime(&needed_raw);
        match needed_at {
            Some(at) if at < now - Duration::minutes(PAST_GRACE_MINUTES) => {
                errors.push("Needed time cannot be in the past.".to_string());
            }
            Some(_) => {}
            None => errors.push("Invalid needed date or time.".to_string()),
        }

        match needed_at {
            Some(needed_at) if errors.is_empty() => Ok(NewTransportRequest {
                shelter,
                first_name,
                last_name,
                dob,
                needed_at,
                pickup_location,
                destination,
                reason: optional_field(&self.reason),
                resident_notes: optional_field(&self.resident_notes),
                callback_phone: optional_field(&self.callback_phone),
            }),
            _ => Err(AppError::InvalidForm(errors)),
        }
    }
}

pub struct TransportService {
    db: PgPool,
}

impl TransportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn submit(&self, request: &NewTransportRequest) -> Result<i64> {
        let mut tx = self.db.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transport_requests
                (shelter, first_name, last_name, dob, needed_at, pickup_location, destination,
                 reason, resident_notes, callback_phone, status, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', date_trunc('second', NOW()))
            RETURNING id
            "#,
        )
        .bind(&request.shelter)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.dob)
        .bind(request.needed_at)
        .bind(&request.pickup_location)
        .bind(&request.destination)
        .bind(&request.reason)
        .bind(&request.resident_notes)
        .bind(&request.callback_phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::TRANSPORT,
                entity_id: Some(id),
                shelter: Some(&request.shelter),
                staff_user_id: None,
                action_type: "create",
                details: "Resident submitted transportation request",
            },
        )
        .await?;

        tx.commit().await?;
        metrics_service::record_submission("transport", &request.shelter);
        tracing::info!(request_id = id, shelter = %request.shelter, "Transport request submitted");
        Ok(id)
    }

    /// Pending requests, newest submission first.
    pub async fn list_pending(&self, shelter: &str) -> Result<Vec<TransportRequest>> {
        let sql = format!(
            "SELECT {} FROM transport_requests WHERE status = $1 AND shelter = $2 \
             ORDER BY submitted_at DESC, id DESC",
            TRANSPORT_COLUMNS
        );
        self.fetch(&sql, TransportStatus::Pending, shelter).await
    }

    /// Scheduled rides, soonest first.
    pub async fn list_scheduled(&self, shelter: &str) -> Result<Vec<TransportRequest>> {
        let sql = format!(
            "SELECT {} FROM transport_requests WHERE status = $1 AND shelter = $2 \
             ORDER BY needed_at ASC",
            TRANSPORT_COLUMNS
        );
        self.fetch(&sql, TransportStatus::Scheduled, shelter).await
    }

    pub async fn schedule(
        &self,
        id: i64,
        shelter: &str,
        staff_id: i64,
        driver_name: &str,
        staff_notes: Option<&str>,
    ) -> Result<()> {
        let driver_name = driver_name.trim();
        if driver_name.is_empty() {
            return Err(AppError::Validation("Driver name required.".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE transport_requests
            SET status = $1, scheduled_at = date_trunc('second', NOW()), scheduled_by = $2,
                driver_name = $3, staff_notes = $4
            WHERE id = $5 AND shelter = $6 AND status = $7
            RETURNING id
            "#,
        )
        .bind(TransportStatus::Scheduled.as_str())
        .bind(staff_id)
        .bind(driver_name)
        .bind(staff_notes)
        .bind(id)
        .bind(shelter)
        .bind(TransportStatus::Pending.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.is_none() {
            return Err(AppError::Conflict("Not pending.".to_string()));
        }

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::TRANSPORT,
                entity_id: Some(id),
                shelter: Some(shelter),
                staff_user_id: Some(staff_id),
                action_type: "schedule",
                details: &format!("Driver {}", driver_name),
            },
        )
        .await?;

        tx.commit().await?;
        metrics_service::record_staff_action("transport", "schedule");
        Ok(())
    }

    /// Mark a scheduled ride as done.
    pub async fn complete(&self, id: i64, shelter: &str, staff_id: i64) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE transport_requests
            SET status = $1, completed_at = date_trunc('second', NOW()), completed_by = $2
            WHERE id = $3 AND shelter = $4 AND status = $5
            RETURNING id
            "#,
        )
        .bind(TransportStatus::Completed.as_str())
        .bind(staff_id)
        .bind(id)
        .bind(shelter)
        .bind(TransportStatus::Scheduled.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.is_none() {
            return Err(AppError::Conflict("Not scheduled.".to_string()));
        }

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::TRANSPORT,
                entity_id: Some(id),
                shelter: Some(shelter),
                staff_user_id: Some(staff_id),
                action_type: "complete",
                details: "",
            },
        )
        .await?;

        tx.commit().await?;
        metrics_service::record_staff_action("transport", "complete");
        Ok(())
    }

    /// Cancel a pending or scheduled ride. A reason is required.
    pub async fn cancel(&self, id: i64, shelter: &str, staff_id: i64, reason: &str) -> Result<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("Cancel reason required.".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE transport_requests
            SET status = $1, cancelled_at = date_trunc('second', NOW()), cancelled_by = $2,
                cancel_reason = $3
            WHERE id = $4 AND shelter = $5 AND status IN ($6, $7)
            RETURNING id
            "#,
        )
        .bind(TransportStatus::Cancelled.as_str())
        .bind(staff_id)
        .bind(reason)
        .bind(id)
        .bind(shelter)
        .bind(TransportStatus::Pending.as_str())
        .bind(TransportStatus::Scheduled.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.is_none() {
            return Err(AppError::Conflict("Not pending or scheduled.".to_string()));
        }

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::TRANSPORT,
                entity_id: Some(id),
                shelter: Some(shelter),
                staff_user_id: Some(staff_id),
                action_type: "cancel",
                details: reason,
            },
        )
        .await?;

        tx.commit().await?;
        metrics_service::record_staff_action("transport", "cancel");
        Ok(())
    }

    async fn fetch(
        &self,
        sql: &str,
        status: TransportStatus,
        shelter: &str,
    ) -> Result<Vec<TransportRequest>> {
        sqlx::query_as::<_, TransportRequest>(sql)
            .bind(status.as_str())
            .bind(shelter)
            .fetch_all(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn shelters() -> Vec<String> {
        vec!["Abba".into(), "Haven".into()]
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn valid() -> TransportSubmission {
        TransportSubmission {
            shelter: Some("Abba".into()),
            first_name: Some("Jo".into()),
            last_name: Some("Park".into()),
            dob: Some("1985-11-30".into()),
            needed_at: Some("2025-06-02T08:30".into()),
            pickup_location: Some("Front desk".into()),
            destination: Some("Clinic".into()),
            reason: None,
            resident_notes: None,
            callback_phone: Some(" 555-0100 ".into()),
        }
    }

    fn errors_of(result: Result<NewTransportRequest>) -> Vec<String> {
        match result {
            Err(AppError::InvalidForm(errors)) => errors,
            other => panic!("expected InvalidForm, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_submission() {
        let request = valid().validate(&shelters(), now()).unwrap();
        assert_eq!(request.callback_phone.as_deref(), Some("555-0100"));
        assert_eq!(request.reason, None);
    }

    #[test]
    fn test_unknown_shelter() {
        let submission = TransportSubmission {
            shelter: None,
            ..valid()
        };
        assert!(matches!(
            submission.validate(&shelters(), now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_past_time_rejected() {
        let submission = TransportSubmission {
            needed_at: Some("2025-06-01T11:58".into()),
            ..valid()
        };
        let errors = errors_of(submission.validate(&shelters(), now()));
        assert_eq!(errors, vec!["Needed time cannot be in the past."]);
    }

    #[test]
    fn test_within_grace_period_allowed() {
        let submission = TransportSubmission {
            needed_at: Some("2025-06-01T11:59:30".into()),
            ..valid()
        };
        assert!(submission.validate(&shelters(), now()).is_ok());
    }

    #[test]
    fn test_missing_pickup_reported() {
        let submission = TransportSubmission {
            pickup_location: Some("".into()),
            ..valid()
        };
        let errors = errors_of(submission.validate(&shelters(), now()));
        assert_eq!(errors, vec!["Complete all required fields."]);
    }

    #[test]
    fn test_invalid_time_reported() {
        let submission = TransportSubmission {
            needed_at: Some("soon".into()),
            ..valid()
        };
        let errors = errors_of(submission.validate(&shelters(), now()));
        assert_eq!(errors, vec!["Invalid needed date or time."]);
    }
}
