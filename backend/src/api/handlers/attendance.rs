//! Attendance board and check-in/check-out handlers.

use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::handlers::leave::{ActionResponse, NoteRequest};
use crate::api::middleware::auth::AuthExtension;
use crate::api::validation::{field, now_seconds, optional_field, parse_datetime};
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::attendance::AttendanceStatus;
use crate::services::attendance_service::AttendanceService;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(board))
        .route("/:resident_id/check-in", post(check_in))
        .route("/:resident_id/check-out", post(check_out))
}

#[derive(Debug, Serialize)]
pub struct AttendanceBoard {
    pub shelter: String,
    pub residents: Vec<AttendanceStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckOutRequest {
    pub note: Option<String>,
    pub expected_back_time: Option<String>,
}

/// GET /api/v1/staff/attendance
pub async fn board(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<AttendanceBoard>> {
    let shelter = auth.require_shelter()?;
    let residents = AttendanceService::new(state.db.clone())
        .board(shelter, now_seconds())
        .await?;
    Ok(Json(AttendanceBoard {
        shelter: shelter.to_string(),
        residents,
    }))
}

/// POST /api/v1/staff/attendance/:resident_id/check-in
pub async fn check_in(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(resident_id): Path<i64>,
    payload: Option<Json<NoteRequest>>,
) -> Result<Json<ActionResponse>> {
    let shelter = auth.require_shelter()?;
    let note = payload.and_then(|Json(p)| optional_field(&p.note));
    AttendanceService::new(state.db.clone())
        .check_in(resident_id, shelter, auth.staff_user_id, note.as_deref())
        .await?;
    Ok(Json(ActionResponse {
        id: resident_id,
        message: "Checked in.",
    }))
}

/// POST /api/v1/staff/attendance/:resident_id/check-out
pub async fn check_out(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(resident_id): Path<i64>,
    payload: Option<Json<CheckOutRequest>>,
) -> Result<Json<ActionResponse>> {
    let shelter = auth.require_shelter()?;
    let Json(payload) = payload.unwrap_or_default();
    let note = optional_field(&payload.note);

    let expected_raw = field(&payload.expected_back_time);
    let expected_back = if expected_raw.is_empty() {
        None
    } else {
        Some(parse_datetime(&expected_raw).ok_or_else(|| {
            AppError::Validation("Invalid expected back time.".to_string())
        })?)
    };

    AttendanceService::new(state.db.clone())
        .check_out(
            resident_id,
            shelter,
            auth.staff_user_id,
            note.as_deref(),
            expected_back,
        )
        .await?;
    Ok(Json(ActionResponse {
        id: resident_id,
        message: "Checked out.",
    }))
}
