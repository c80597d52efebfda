//! Resident roster handlers (staff or admin, shelter selected).

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::handlers::leave::ActionResponse;
use crate::api::middleware::auth::AuthExtension;
use crate::api::validation::field;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::resident::Resident;
use crate::services::resident_service::{parse_active_flag, CreateResidentRequest, ResidentService};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_residents).post(create_resident))
        .route("/:id/set-active", post(set_active))
}

#[derive(Debug, Deserialize)]
pub struct ListResidentsQuery {
    /// `all` includes inactive residents; anything else lists active only.
    pub show: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResidentListResponse {
    pub shelter: String,
    pub show: String,
    pub items: Vec<Resident>,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: Option<String>,
}

/// GET /api/v1/staff/residents
pub async fn list_residents(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Query(query): Query<ListResidentsQuery>,
) -> Result<Json<ResidentListResponse>> {
    let shelter = auth.require_shelter()?;

    let show = field(&query.show);
    let show = if show.is_empty() { "active".to_string() } else { show };
    let items = ResidentService::new(state.db.clone())
        .list(shelter, show == "all")
        .await?;

    Ok(Json(ResidentListResponse {
        shelter: shelter.to_string(),
        show,
        items,
    }))
}

/// POST /api/v1/staff/residents
pub async fn create_resident(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<CreateResidentRequest>,
) -> Result<(StatusCode, Json<Resident>)> {
    let shelter = auth.require_shelter()?;

    let resident = ResidentService::new(state.db.clone())
        .create(shelter, &payload, auth.staff_user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(resident)))
}

/// POST /api/v1/staff/residents/:id/set-active - `active` must be "0" or "1".
pub async fn set_active(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<ActionResponse>> {
    let shelter = auth.require_shelter()?;

    let active = parse_active_flag(&field(&payload.active))?;
    ResidentService::new(state.db.clone())
        .set_active(id, shelter, active, auth.staff_user_id)
        .await?;
    Ok(Json(ActionResponse {
        id,
        message: "Updated.",
    }))
}
