//! Staff login, logout, and shelter selection.

use axum::{
    extract::{Extension, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::auth::AuthExtension;
use crate::api::validation::{field, require_shelter};
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::staff_user::Role;
use crate::services::auth_service::SessionToken;
use crate::services::metrics_service;
use crate::services::staff_user_service::StaffUserService;

/// Routes that need no session.
pub fn public_router() -> Router<SharedState> {
    Router::new().route("/login", post(login))
}

/// Routes for a logged-in staff member (wrapped in `require_auth`).
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/select-shelter", get(list_shelters).post(select_shelter))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub session: SessionToken,
    pub username: String,
    pub role: Role,
    /// Always null after login; the next step is `select-shelter`.
    pub shelter: Option<String>,
}

/// POST /api/v1/staff/login
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let username = field(&payload.username);
    let password = field(&payload.password);

    let user = match StaffUserService::new(state.db.clone(), &state.auth)
        .authenticate(&username, &password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            metrics_service::record_login(false);
            return Err(e);
        }
    };
    metrics_service::record_login(true);

    let role = user
        .role()
        .ok_or_else(|| AppError::Internal(format!("user {} has invalid role", user.id)))?;
    let session = state.auth.issue(user.id, &user.username, role, None)?;

    tracing::info!(user_id = user.id, username = %user.username, "Staff login");
    Ok(Json(LoginResponse {
        session,
        username: user.username,
        role,
        shelter: None,
    }))
}

/// POST /api/v1/staff/logout
pub async fn logout(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<serde_json::Value>> {
    StaffUserService::new(state.db.clone(), &state.auth)
        .record_logout(auth.staff_user_id, &auth.username)
        .await?;
    Ok(Json(serde_json::json!({ "logged_out": true })))
}

/// GET /api/v1/staff/select-shelter
pub async fn list_shelters(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(state.config.shelters.clone())
}

#[derive(Debug, Deserialize)]
pub struct SelectShelterRequest {
    pub shelter: Option<String>,
}

/// POST /api/v1/staff/select-shelter - returns a token scoped to the shelter.
pub async fn select_shelter(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<SelectShelterRequest>,
) -> Result<Json<SessionToken>> {
    let shelter = field(&payload.shelter);
    require_shelter(&state.config.shelters, &shelter)?;
    let session = state.auth.with_shelter(&auth.claims, &shelter)?;
    Ok(Json(session))
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub staff_user_id: i64,
    pub username: String,
    pub role: Role,
    pub shelter: Option<String>,
}

/// GET /api/v1/staff/me
pub async fn me(Extension(auth): Extension<AuthExtension>) -> Json<MeResponse> {
    Json(MeResponse {
        staff_user_id: auth.staff_user_id,
        username: auth.username,
        role: auth.role,
        shelter: auth.shelter,
    })
}
