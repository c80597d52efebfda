//! Staff leave review handlers. All views are scoped to the session shelter.

use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::auth::AuthExtension;
use crate::api::validation::{field, now_seconds, optional_field};
use crate::api::SharedState;
use crate::error::Result;
use crate::models::leave_request::LeaveRequest;
use crate::services::leave_service::LeaveService;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/pending", get(list_pending))
        .route("/away-now", get(list_away_now))
        .route("/overdue", get(list_overdue))
        .route("/:id/approve", post(approve))
        .route("/:id/deny", post(deny))
        .route("/:id/check-in", post(check_in))
}

#[derive(Debug, Default, Deserialize)]
pub struct NoteRequest {
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaveListResponse {
    pub shelter: String,
    pub items: Vec<LeaveRequest>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub id: i64,
    pub message: &'static str,
}

/// GET /api/v1/staff/leave/pending
pub async fn list_pending(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<LeaveListResponse>> {
    let shelter = auth.require_shelter()?;
    let items = LeaveService::new(state.db.clone())
        .list_pending(shelter)
        .await?;
    Ok(Json(LeaveListResponse {
        shelter: shelter.to_string(),
        items,
    }))
}

/// GET /api/v1/staff/leave/away-now
pub async fn list_away_now(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<LeaveListResponse>> {
    let shelter = auth.require_shelter()?;
    let items = LeaveService::new(state.db.clone())
        .list_away_now(shelter, now_seconds())
        .await?;
    Ok(Json(LeaveListResponse {
        shelter: shelter.to_string(),
        items,
    }))
}

/// GET /api/v1/staff/leave/overdue
pub async fn list_overdue(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<LeaveListResponse>> {
    let shelter = auth.require_shelter()?;
    let items = LeaveService::new(state.db.clone())
        .list_overdue(shelter, now_seconds())
        .await?;
    Ok(Json(LeaveListResponse {
        shelter: shelter.to_string(),
        items,
    }))
}

/// POST /api/v1/staff/leave/:id/approve
pub async fn approve(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    payload: Option<Json<NoteRequest>>,
) -> Result<Json<ActionResponse>> {
    let shelter = auth.require_shelter()?;
    let note = payload.and_then(|Json(p)| optional_field(&p.note));
    LeaveService::new(state.db.clone())
        .approve(id, shelter, auth.staff_user_id, note.as_deref())
        .await?;
    Ok(Json(ActionResponse {
        id,
        message: "Approved.",
    }))
}

/// POST /api/v1/staff/leave/:id/deny - a note is required.
pub async fn deny(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    Json(payload): Json<NoteRequest>,
) -> Result<Json<ActionResponse>> {
    let shelter = auth.require_shelter()?;
    let note = field(&payload.note);
    LeaveService::new(state.db.clone())
        .deny(id, shelter, auth.staff_user_id, &note)
        .await?;
    Ok(Json(ActionResponse {
        id,
        message: "Denied.",
    }))
}

/// POST /api/v1/staff/leave/:id/check-in
pub async fn check_in(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    payload: Option<Json<NoteRequest>>,
) -> Result<Json<ActionResponse>> {
    let shelter = auth.require_shelter()?;
    let note = payload.and_then(|Json(p)| optional_field(&p.note));
    LeaveService::new(state.db.clone())
        .check_in(id, shelter, auth.staff_user_id, note.as_deref())
        .await?;
    Ok(Json(ActionResponse {
        id,
        message: "Checked in.",
    }))
}
