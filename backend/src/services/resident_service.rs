//! Resident roster per shelter.

use serde::Deserialize;
use sqlx::PgPool;

use crate::api::validation::{all_present, field};
use crate::error::{AppError, Result};
use crate::models::resident::Resident;
use crate::services::audit_service::{self, entity, AuditRecord};

#[derive(Debug, Default, Deserialize)]
pub struct CreateResidentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
}

/// Parse the `active` flag of a set-active form: only "0" and "1" are valid.
pub fn parse_active_flag(raw: &str) -> Result<bool> {
    match raw.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(AppError::Validation("Invalid action.".to_string())),
    }
}

pub struct ResidentService {
    db: PgPool,
}

impl ResidentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Residents of a shelter ordered by name. With `include_inactive`,
    /// active residents come first.
    pub async fn list(&self, shelter: &str, include_inactive: bool) -> Result<Vec<Resident>> {
        let sql = if include_inactive {
            r#"
            SELECT id, shelter, first_name, last_name, dob, is_active, created_at
            FROM residents
            WHERE shelter = $1
            ORDER BY is_active DESC, last_name, first_name
            "#
        } else {
            r#"
            SELECT id, shelter, first_name, last_name, dob, is_active, created_at
            FROM residents
            WHERE shelter = $1 AND is_active = TRUE
            ORDER BY last_name, first_name
            "#
        };

        sqlx::query_as::<_, Resident>(sql)
            .bind(shelter)
            .fetch_all(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn create(
        &self,
        shelter: &str,
        request: &CreateResidentRequest,
        staff_id: i64,
    ) -> Result<Resident> {
        let first_name = field(&request.first_name);
        let last_name = field(&request.last_name);
        let dob = field(&request.dob);
        if !all_present(&[&first_name, &last_name, &dob]) {
            return Err(AppError::Validation(
                "First name, last name, and date of birth are required.".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let resident: Resident = sqlx::query_as(
            r#"
            INSERT INTO residents (shelter, first_name, last_name, dob, is_active, created_at)
            VALUES ($1, $2, $3, $4, TRUE, date_trunc('second', NOW()))
            RETURNING id, shelter, first_name, last_name, dob, is_active, created_at
            "#,
        )
        .bind(shelter)
        .bind(&first_name)
        .bind(&last_name)
        .bind(&dob)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::RESIDENT,
                entity_id: Some(resident.id),
                shelter: Some(shelter),
                staff_user_id: Some(staff_id),
                action_type: "create",
                details: &format!("{} {} {}", first_name, last_name, dob),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(resident)
    }

    pub async fn set_active(
        &self,
        id: i64,
        shelter: &str,
        active: bool,
        staff_id: i64,
    ) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE residents SET is_active = $1 WHERE id = $2 AND shelter = $3 RETURNING id",
        )
        .bind(active)
        .bind(id)
        .bind(shelter)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.is_none() {
            return Err(AppError::NotFound("Resident not found.".to_string()));
        }

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::RESIDENT,
                entity_id: Some(id),
                shelter: Some(shelter),
                staff_user_id: Some(staff_id),
                action_type: "set_active",
                details: &format!("active={}", if active { 1 } else { 0 }),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// True if the resident exists in the given shelter.
    pub async fn exists_in_shelter(&self, id: i64, shelter: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM residents WHERE id = $1 AND shelter = $2")
                .bind(id)
                .bind(shelter)
                .fetch_optional(&self.db)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_flag_accepts_only_zero_and_one() {
        assert!(parse_active_flag("1").unwrap());
        assert!(!parse_active_flag("0").unwrap());
        assert!(parse_active_flag("true").is_err());
        assert!(parse_active_flag("").is_err());
    }

    #[test]
    fn test_create_request_fields_optional_in_json() {
        let request: CreateResidentRequest = serde_json::from_str(r#"{"first_name": "Lee"}"#).unwrap();
        assert_eq!(request.first_name.as_deref(), Some("Lee"));
        assert!(request.dob.is_none());
    }
}
