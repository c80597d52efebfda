//! Admin handlers: staff accounts and the audit log.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::auth::AuthExtension;
use crate::api::validation::field;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::audit_log::AuditEntry;
use crate::models::staff_user::{Role, StaffUserSummary};
use crate::services::audit_service::{AuditQuery, AuditService};
use crate::services::resident_service::parse_active_flag;
use crate::services::staff_user_service::StaffUserService;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:username", delete(delete_user))
        .route("/users/:username/set-active", post(set_user_active))
        .route("/audit-log", get(list_audit_log))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl CreateUserRequest {
    /// Required username and password; role defaults to staff.
    pub fn validate(&self) -> Result<(String, String, Role)> {
        let username = field(&self.username);
        let password = field(&self.password);
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password required.".to_string(),
            ));
        }

        let role = field(&self.role);
        let role = if role.is_empty() {
            Role::Staff
        } else {
            role.parse()
                .map_err(|_| AppError::Validation("Invalid role.".to_string()))?
        };

        Ok((username, password, role))
    }
}

#[derive(Debug, Deserialize)]
pub struct SetUserActiveRequest {
    pub active: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<Vec<StaffUserSummary>>> {
    auth.require_admin()?;
    let users = StaffUserService::new(state.db.clone(), &state.auth)
        .list()
        .await?;
    Ok(Json(users))
}

/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<StaffUserSummary>)> {
    auth.require_admin()?;
    let (username, password, role) = payload.validate()?;

    let user = StaffUserService::new(state.db.clone(), &state.auth)
        .create(&username, &password, role, auth.staff_user_id)
        .await?;
    tracing::info!(username = %user.username, role = %role, "Staff user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// DELETE /api/v1/admin/users/:username
pub async fn delete_user(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>> {
    auth.require_admin()?;
    if username == auth.username {
        return Err(AppError::Validation(
            "You cannot delete yourself.".to_string(),
        ));
    }

    let deleted = StaffUserService::new(state.db.clone(), &state.auth)
        .delete(&username, auth.staff_user_id)
        .await?;
    if !deleted {
        return Err(AppError::NotFound(format!("User '{}' not found.", username)));
    }

    Ok(Json(MessageResponse {
        message: format!("User '{}' deleted.", username),
    }))
}

/// POST /api/v1/admin/users/:username/set-active
pub async fn set_user_active(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(username): Path<String>,
    Json(payload): Json<SetUserActiveRequest>,
) -> Result<Json<MessageResponse>> {
    auth.require_admin()?;
    let active = parse_active_flag(&field(&payload.active))?;
    if username == auth.username && !active {
        return Err(AppError::Validation(
            "You cannot deactivate yourself.".to_string(),
        ));
    }

    let updated = StaffUserService::new(state.db.clone(), &state.auth)
        .set_active(&username, active, auth.staff_user_id)
        .await?;
    if !updated {
        return Err(AppError::NotFound(format!("User '{}' not found.", username)));
    }

    Ok(Json(MessageResponse {
        message: "Updated.".to_string(),
    }))
}

/// GET /api/v1/admin/audit-log
pub async fn list_audit_log(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>> {
    auth.require_admin()?;
    let entries = AuditService::new(state.db.clone()).list(&query).await?;
    Ok(Json(entries))
}
