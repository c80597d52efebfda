//! Resident leave requests: submission, staff review, and return check-in.
//!
//! Every state change is a conditional `UPDATE ... WHERE status = <expected>`
//! committed together with its audit record, so two staff members acting on
//! the same request cannot both succeed.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::PgPool;

use crate::api::validation::{all_present, field, optional_field, parse_datetime, require_shelter};
use crate::error::{AppError, Result};
use crate::models::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::services::audit_service::{self, entity, AuditRecord};
use crate::services::metrics_service;

const LEAVE_COLUMNS: &str = r#"
    id, shelter, first_name, last_name, dob, destination, reason, resident_notes,
    resident_phone, leave_at, return_at, status, submitted_at, decided_at, decided_by,
    decision_note, check_in_at, check_in_by
"#;

/// Leave form as submitted by a resident.
#[derive(Debug, Default, Deserialize)]
pub struct LeaveSubmission {
    pub shelter: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub destination: Option<String>,
    pub reason: Option<String>,
    pub resident_notes: Option<String>,
    pub resident_phone: Option<String>,
    pub leave_at: Option<String>,
    pub return_at: Option<String>,
    #[serde(default)]
    pub agreed: bool,
}

impl LeaveSubmission {
    /// Validate a submission. An unknown shelter is rejected on its own;
    /// every other problem is collected and reported together.
    pub fn validate(&self, shelters: &[String], max_days: i64) -> Result<NewLeaveRequest> {
        let shelter = field(&self.shelter);
        require_shelter(shelters, &shelter)?;

        let first_name = field(&self.first_name);
        let last_name = field(&self.last_name);
        let dob = field(&self.dob);
        let destination = field(&self.destination);
        let leave_raw = field(&self.leave_at);
        let return_raw = field(&self.return_at);

        let mut errors = Vec::new();
        if !self.agreed {
            errors.push("You must accept the agreement.".to_string());
        }
        if !all_present(&[
            &first_name,
            &last_name,
            &dob,
            &destination,
            &leave_raw,
            &return_raw,
        ]) {
            errors.push("Complete all required fields.".to_string());
        }

        let window = match (parse_datetime(&leave_raw), parse_datetime(&return_raw)) {
            (Some(leave_at), Some(return_at)) => {
                if return_at <= leave_at {
                    errors.push("Return must be after leave.".to_string());
                }
                let latest_return = Duration::try_days(max_days)
                    .and_then(|limit| leave_at.checked_add_signed(limit));
                if latest_return.map_or(true, |latest| return_at > latest) {
                    errors.push(format!("Maximum leave is {} days.", max_days));
                }
                Some((leave_at, return_at))
            }
            _ => {
                errors.push("Invalid date or time.".to_string());
                None
            }
        };

        match window {
            Some((leave_at, return_at)) if errors.is_empty() => Ok(NewLeaveRequest {
                shelter,
                first_name,
                last_name,
                dob,
                destination,
                reason: optional_field(&self.reason),
                resident_notes: optional_field(&self.resident_notes),
                resident_phone: optional_field(&self.resident_phone),
                leave_at,
                return_at,
            }),
            _ => Err(AppError::InvalidForm(errors)),
        }
    }
}

/// Overdue leave count for one shelter.
#[derive(Debug, sqlx::FromRow)]
pub struct ShelterCount {
    pub shelter: String,
    pub count: i64,
}

pub struct LeaveService {
    db: PgPool,
}

impl LeaveService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Store a validated leave request as pending and return its id.
    pub async fn submit(&self, request: &NewLeaveRequest) -> Result<i64> {
        let mut tx = self.db.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO leave_requests
                (shelter, first_name, last_name, dob, destination, reason, resident_notes,
                 resident_phone, leave_at, return_at, status, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', date_trunc('second', NOW()))
            RETURNING id
            "#,
        )
        .bind(&request.shelter)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.dob)
        .bind(&request.destination)
        .bind(&request.reason)
        .bind(&request.resident_notes)
        .bind(&request.resident_phone)
        .bind(request.leave_at)
        .bind(request.return_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::LEAVE,
                entity_id: Some(id),
                shelter: Some(&request.shelter),
                staff_user_id: None,
                action_type: "create",
                details: "Resident submitted leave request",
            },
        )
        .await?;

        tx.commit().await?;
        metrics_service::record_submission("leave", &request.shelter);
        tracing::info!(request_id = id, shelter = %request.shelter, "Leave request submitted");
        Ok(id)
    }

    /// Pending requests in a shelter, newest submission first.
    pub async fn list_pending(&self, shelter: &str) -> Result<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {} FROM leave_requests WHERE status = $1 AND shelter = $2 \
             ORDER BY submitted_at DESC, id DESC",
            LEAVE_COLUMNS
        );
        self.fetch(&sql, LeaveStatus::Pending, shelter, None).await
    }

    /// Approved leaves that have started and are not yet checked in.
    pub async fn list_away_now(&self, shelter: &str, now: DateTime<Utc>) -> Result<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {} FROM leave_requests \
             WHERE status = $1 AND shelter = $2 AND leave_at <= $3 AND check_in_at IS NULL \
             ORDER BY return_at ASC",
            LEAVE_COLUMNS
        );
        self.fetch(&sql, LeaveStatus::Approved, shelter, Some(now)).await
    }

    /// Approved leaves past their return time and not yet checked in.
    pub async fn list_overdue(&self, shelter: &str, now: DateTime<Utc>) -> Result<Vec<LeaveRequest>> {
        let sql = format!(
            "SELECT {} FROM leave_requests \
             WHERE status = $1 AND shelter = $2 AND return_at < $3 AND check_in_at IS NULL \
             ORDER BY return_at ASC",
            LEAVE_COLUMNS
        );
        self.fetch(&sql, LeaveStatus::Approved, shelter, Some(now)).await
    }

    pub async fn approve(
        &self,
        id: i64,
        shelter: &str,
        staff_id: i64,
        note: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE leave_requests
            SET status = $1, decided_at = date_trunc('second', NOW()), decided_by = $2,
                decision_note = $3
            WHERE id = $4 AND shelter = $5 AND status = $6
            RETURNING id
            "#,
        )
        .bind(LeaveStatus::Approved.as_str())
        .bind(staff_id)
        .bind(note)
        .bind(id)
        .bind(shelter)
        .bind(LeaveStatus::Pending.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.is_none() {
            return Err(AppError::Conflict("Not pending.".to_string()));
        }

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::LEAVE,
                entity_id: Some(id),
                shelter: Some(shelter),
                staff_user_id: Some(staff_id),
                action_type: "approve",
                details: note.unwrap_or_default(),
            },
        )
        .await?;

        tx.commit().await?;
        metrics_service::record_staff_action("leave", "approve");
        Ok(())
    }

    pub async fn deny(&self, id: i64, shelter: &str, staff_id: i64, note: &str) -> Result<()> {
        if note.trim().is_empty() {
            return Err(AppError::Validation("Denial note required.".to_string()));
        }

        let mut tx = self.db.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE leave_requests
            SET status = $1, decided_at = date_trunc('second', NOW()), decided_by = $2,
                decision_note = $3
            WHERE id = $4 AND shelter = $5 AND status = $6
            RETURNING id
            "#,
        )
        .bind(LeaveStatus::Denied.as_str())
        .bind(staff_id)
        .bind(note)
        .bind(id)
        .bind(shelter)
        .bind(LeaveStatus::Pending.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.is_none() {
            return Err(AppError::Conflict("Not pending.".to_string()));
        }

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::LEAVE,
                entity_id: Some(id),
                shelter: Some(shelter),
                staff_user_id: Some(staff_id),
                action_type: "deny",
                details: note,
            },
        )
        .await?;

        tx.commit().await?;
        metrics_service::record_staff_action("leave", "deny");
        Ok(())
    }

    /// Mark an approved leave as returned.
    pub async fn check_in(
        &self,
        id: i64,
        shelter: &str,
        staff_id: i64,
        note: Option<&str>,
    ) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE leave_requests
            SET status = $1, check_in_at = date_trunc('second', NOW()), check_in_by = $2
            WHERE id = $3 AND shelter = $4 AND status = $5 AND check_in_at IS NULL
            RETURNING id
            "#,
        )
        .bind(LeaveStatus::CheckedIn.as_str())
        .bind(staff_id)
        .bind(id)
        .bind(shelter)
        .bind(LeaveStatus::Approved.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.is_none() {
            return Err(AppError::Conflict(
                "Not an approved leave awaiting check-in.".to_string(),
            ));
        }

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::LEAVE,
                entity_id: Some(id),
                shelter: Some(shelter),
                staff_user_id: Some(staff_id),
                action_type: "check_in",
                details: note.unwrap_or_default(),
            },
        )
        .await?;

        tx.commit().await?;
        metrics_service::record_staff_action("leave", "check_in");
        Ok(())
    }

    /// Overdue leave counts grouped by shelter (shelters with none are omitted).
    pub async fn count_overdue_by_shelter(&self, now: DateTime<Utc>) -> Result<Vec<ShelterCount>> {
        let counts: Vec<ShelterCount> = sqlx::query_as(
            r#"
            SELECT shelter, COUNT(*) AS count
            FROM leave_requests
            WHERE status = $1 AND return_at < $2 AND check_in_at IS NULL
            GROUP BY shelter
            "#,
        )
        .bind(LeaveStatus::Approved.as_str())
        .bind(now)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(counts)
    }

    async fn fetch(
        &self,
        sql: &str,
        status: LeaveStatus,
        shelter: &str,
        now: Option<DateTime<Utc>>,
    ) -> Result<Vec<LeaveRequest>> {
        let mut query = sqlx::query_as::<_, LeaveRequest>(sql)
            .bind(status.as_str())
            .bind(shelter);
        if let Some(now) = now {
            query = query.bind(now);
        }

        query
            .fetch_all(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
