//! Staff account management: login checks, admin bootstrap, and the admin
//! user directory.

use sqlx::{PgExecutor, PgPool};

use crate::error::{AppError, Result};
use crate::models::staff_user::{Role, StaffUser, StaffUserSummary};
use crate::services::audit_service::{self, entity, AuditRecord, AuditService};
use crate::services::auth_service::AuthService;

const INVALID_LOGIN: &str = "Invalid login.";

/// Outcome of a startup admin bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// An admin already exists; nothing was done.
    AdminExists,
    /// No admin exists and no credentials were configured.
    NotConfigured,
    Created(String),
}

pub struct StaffUserService<'a> {
    db: PgPool,
    auth: &'a AuthService,
}

impl<'a> StaffUserService<'a> {
    pub fn new(db: PgPool, auth: &'a AuthService) -> Self {
        Self { db, auth }
    }

    /// Create the first admin from configured credentials when no admin exists.
    pub async fn bootstrap_admin(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<BootstrapOutcome> {
        let admins: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM staff_users WHERE role = 'admin'")
                .fetch_one(&self.db)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

        if admins > 0 {
            return Ok(BootstrapOutcome::AdminExists);
        }

        let (Some(username), Some(password)) = (username, password) else {
            return Ok(BootstrapOutcome::NotConfigured);
        };
        if username.trim().is_empty() || password.trim().is_empty() {
            return Ok(BootstrapOutcome::NotConfigured);
        }

        let password_hash = self.auth.hash_password(password.trim())?;
        insert_user(&self.db, username.trim(), &password_hash, Role::Admin).await?;
        Ok(BootstrapOutcome::Created(username.trim().to_string()))
    }

    /// Verify credentials and record the login. Unknown users, inactive users,
    /// and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<StaffUser> {
        let user: Option<StaffUser> = sqlx::query_as(
            r#"
            SELECT id, username, password_hash, role, is_active, created_at
            FROM staff_users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let user = match user {
            Some(u) if u.is_active && self.auth.verify_password(password, &u.password_hash) => u,
            _ => return Err(AppError::Authentication(INVALID_LOGIN.to_string())),
        };

        if user.role().is_none() {
            tracing::warn!(user_id = user.id, role = %user.role, "Staff user has unknown role");
            return Err(AppError::Authentication(INVALID_LOGIN.to_string()));
        }

        AuditService::new(self.db.clone())
            .record(AuditRecord {
                entity_type: entity::STAFF,
                entity_id: Some(user.id),
                shelter: None,
                staff_user_id: Some(user.id),
                action_type: "login",
                details: &format!("Login {}", user.username),
            })
            .await?;

        Ok(user)
    }

    pub async fn record_logout(&self, staff_user_id: i64, username: &str) -> Result<()> {
        AuditService::new(self.db.clone())
            .record(AuditRecord {
                entity_type: entity::STAFF,
                entity_id: Some(staff_user_id),
                shelter: None,
                staff_user_id: Some(staff_user_id),
                action_type: "logout",
                details: &format!("Logout {}", username),
            })
            .await
    }

    /// All users, newest first.
    pub async fn list(&self) -> Result<Vec<StaffUserSummary>> {
        let users: Vec<StaffUserSummary> = sqlx::query_as(
            r#"
            SELECT id, username, role, is_active, created_at
            FROM staff_users
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users)
    }

    /// Create a user. The account and its audit row commit together.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: Role,
        actor_id: i64,
    ) -> Result<StaffUserSummary> {
        let password_hash = self.auth.hash_password(password)?;
        let mut tx = self.db.begin().await?;

        let user = insert_user(&mut *tx, username, &password_hash, role).await?;
        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::STAFF,
                entity_id: Some(user.id),
                shelter: None,
                staff_user_id: Some(actor_id),
                action_type: "create",
                details: &format!("Created {} ({})", user.username, user.role),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Delete a user by username. Returns true if a user was removed.
    pub async fn delete(&self, username: &str, actor_id: i64) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        let deleted: Option<i64> =
            sqlx::query_scalar("DELETE FROM staff_users WHERE username = $1 RETURNING id")
                .bind(username)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(id) = deleted else {
            return Ok(false);
        };

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::STAFF,
                entity_id: Some(id),
                shelter: None,
                staff_user_id: Some(actor_id),
                action_type: "delete",
                details: &format!("Deleted {}", username),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn set_active(&self, username: &str, active: bool, actor_id: i64) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE staff_users SET is_active = $2 WHERE username = $1 RETURNING id",
        )
        .bind(username)
        .bind(active)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(id) = updated else {
            return Ok(false);
        };

        audit_service::record_with(
            &mut *tx,
            AuditRecord {
                entity_type: entity::STAFF,
                entity_id: Some(id),
                shelter: None,
                staff_user_id: Some(actor_id),
                action_type: "set_active",
                details: &format!("{} active={}", username, active),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

async fn insert_user<'e, E>(
    executor: E,
    username: &str,
    password_hash: &str,
    role: Role,
) -> Result<StaffUserSummary>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as(
        r#"
        INSERT INTO staff_users (username, password_hash, role, is_active, created_at)
        VALUES ($1, $2, $3, TRUE, date_trunc('second', NOW()))
        RETURNING id, username, role, is_active, created_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(executor)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Username already exists.".to_string())
        }
        other => AppError::Database(other.to_string()),
    })
}
