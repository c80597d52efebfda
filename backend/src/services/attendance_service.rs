//! Attendance board and check-in/check-out events.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::attendance::{AttendanceEventType, AttendanceRow, AttendanceStatus};
use crate::services::audit_service::{self, entity, AuditRecord};
use crate::services::leave_service::ShelterCount;
use crate::services::metrics_service;
use crate::services::resident_service::ResidentService;

pub struct AttendanceService {
    db: PgPool,
}

impl AttendanceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active residents of a shelter with their latest attendance event.
    pub async fn board(&self, shelter: &str, now: DateTime<Utc>) -> Result<Vec<AttendanceStatus>> {
        let rows: Vec<AttendanceRow> = sqlx::query_as(
            r#"
            SELECT r.id AS resident_id, r.first_name, r.last_name, r.dob,
                   e.event_type, e.event_time, e.expected_back_time
            FROM residents r
            LEFT JOIN LATERAL (
                SELECT event_type, event_time, expected_back_time
                FROM attendance_events
                WHERE resident_id = r.id AND shelter = r.shelter
                ORDER BY event_time DESC, id DESC
                LIMIT 1
            ) e ON TRUE
            WHERE r.shelter = $1 AND r.is_active = TRUE
            ORDER BY r.last_name, r.first_name
            "#,
        )
        .bind(shelter)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| AttendanceStatus::from_row(row, now))
            .collect())
    }

    pub async fn check_in(
        &self,
        resident_id: i64,
        shelter: &str,
        staff_id: i64,
        note: Option<&str>,
    ) -> Result<()> {
        self.ensure_resident(resident_id, shelter).await?;
        self.record_event(
            resident_id,
            shelter,
            staff_id,
            AttendanceEventType::CheckIn,
            note,
            None,
            note.unwrap_or_default().to_string(),
        )
        .await
    }

    pub async fn check_out(
        &self,
        resident_id: i64,
        shelter: &str,
        staff_id: i64,
        note: Option<&str>,
        expected_back: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.ensure_resident(resident_id, shelter).await?;

        let details = format!(
            "expected_back={} {}",
            expected_back.map(|t| t.to_rfc3339()).unwrap_or_default(),
            note.unwrap_or_default()
        )
        .trim()
        .to_string();

        self.record_event(
            resident_id,
            shelter,
            staff_id,
            AttendanceEventType::CheckOut,
            note,
            expected_back,
            details,
        )
        .await
    }

    /// Residents whose latest event is a check-out past its expected-back
    /// time, grouped by shelter.
    pub async fn count_overdue_by_shelter(&self, now: DateTime<Utc>) -> Result<Vec<ShelterCount>> {
        let counts: Vec<ShelterCount> = sqlx::query_as(
            r#"
            SELECT r.shelter, COUNT(*) AS count
            FROM residents r
            JOIN LATERAL (
                SELECT event_type, expected_back_time
                FROM attendance_events
                WHERE resident_id = r.id AND shelter = r.shelter
                ORDER BY event_time DESC, id DESC
                LIMIT 1
            ) e ON TRUE
            WHERE r.is_active = TRUE
              AND e.event_type = $1
              AND e.expected_back_time IS NOT NULL
              AND e.expected_back_time < $2
            GROUP BY r.shelter
            "#,
        )
        .bind(AttendanceEventType::CheckOut.as_str())
        .bind(now)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(counts)
    }

    async fn ensure_resident(&self, resident_id: i64, shelter: &str) -> Result<()> {
        if ResidentService::new(self.db.clone())
            .exists_in_shelter(resident_id, shelter)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::NotFound("Resident not found.".to_string()))
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_event(
        &self,
        resident_id: i64,
        shelter: &str,
        staff_id: i64,
        event_type: AttendanceEventType,
        note: Option<&str>,
        expected_back: Option<DateTime<Utc>>,
        details: String,
    ) -> Result<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO attendance_events
                (resident_id, shelter, event_type, event_time, staff_user_id, note, expected_back_time)
            VALUES ($1, $2, $3, date_trunc('second', NOW()), $4, $5, $6)
            "#,
        )
        .bind(resident_id)
        .bind(shelter)
        .bind(event_type.as_str())
        .bind(staff_id)
        .bind(note)
        .bind(expected_back)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::ATTENDANCE,
                entity_id: Some(resident_id),
                shelter: Some(shelter),
                staff_user_id: Some(staff_id),
                action_type: event_type.as_str(),
                details: &details,
            },
        )
        .await?;

        tx.commit().await?;
        metrics_service::record_staff_action("attendance", event_type.as_str());
        Ok(())
    }
}
