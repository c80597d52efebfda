//! Staff transportation handlers.

use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::handlers::leave::ActionResponse;
use crate::api::middleware::auth::AuthExtension;
use crate::api::validation::{field, optional_field};
use crate::api::SharedState;
use crate::error::Result;
use crate::models::transport_request::TransportRequest;
use crate::services::transport_service::TransportService;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/pending", get(list_pending))
        .route("/scheduled", get(list_scheduled))
        .route("/:id/schedule", post(schedule))
        .route("/:id/complete", post(complete))
        .route("/:id/cancel", post(cancel))
}

#[derive(Debug, Serialize)]
pub struct TransportListResponse {
    pub shelter: String,
    pub items: Vec<TransportRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub driver_name: Option<String>,
    pub staff_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// GET /api/v1/staff/transport/pending
pub async fn list_pending(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<TransportListResponse>> {
    let shelter = auth.require_shelter()?;
    let items = TransportService::new(state.db.clone())
        .list_pending(shelter)
        .await?;
    Ok(Json(TransportListResponse {
        shelter: shelter.to_string(),
        items,
    }))
}

/// GET /api/v1/staff/transport/scheduled
pub async fn list_scheduled(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<TransportListResponse>> {
    let shelter = auth.require_shelter()?;
    let items = TransportService::new(state.db.clone())
        .list_scheduled(shelter)
        .await?;
    Ok(Json(TransportListResponse {
        shelter: shelter.to_string(),
        items,
    }))
}

/// POST /api/v1/staff/transport/:id/schedule
pub async fn schedule(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    Json(payload): Json<ScheduleRequest>,
) -> Result<Json<ActionResponse>> {
    let shelter = auth.require_shelter()?;
    let driver_name = field(&payload.driver_name);
    let staff_notes = optional_field(&payload.staff_notes);
    TransportService::new(state.db.clone())
        .schedule(
            id,
            shelter,
            auth.staff_user_id,
            &driver_name,
            staff_notes.as_deref(),
        )
        .await?;
    Ok(Json(ActionResponse {
        id,
        message: "Scheduled.",
    }))
}

/// POST /api/v1/staff/transport/:id/complete
pub async fn complete(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>> {
    let shelter = auth.require_shelter()?;
    TransportService::new(state.db.clone())
        .complete(id, shelter, auth.staff_user_id)
        .await?;
    Ok(Json(ActionResponse {
        id,
        message: "Completed.",
    }))
}

/// POST /api/v1/staff/transport/:id/cancel
pub async fn cancel(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i64>,
    Json(payload): Json<CancelRequest>,
) -> Result<Json<ActionResponse>> {
    let shelter = auth.require_shelter()?;
    let reason = field(&payload.reason);
    TransportService::new(state.db.clone())
        .cancel(id, shelter, auth.staff_user_id, &reason)
        .await?;
    Ok(Json(ActionResponse {
        id,
        message: "Cancelled.",
    }))
}
