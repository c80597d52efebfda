//! Public resident portal: leave and transportation request forms.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::validation::now_seconds;
use crate::api::SharedState;
use crate::error::Result;
use crate::services::leave_service::{LeaveService, LeaveSubmission};
use crate::services::transport_service::{TransportService, TransportSubmission};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leave", get(leave_form).post(submit_leave))
        .route("/transport", get(transport_form).post(submit_transport))
}

#[derive(Debug, Deserialize)]
pub struct ShelterQuery {
    pub shelter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeaveForm {
    pub shelters: Vec<String>,
    /// Preselected shelter, empty unless the query named a known shelter.
    pub shelter: String,
    pub max_days: i64,
}

#[derive(Debug, Serialize)]
pub struct TransportForm {
    pub shelters: Vec<String>,
    pub shelter: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub request_id: i64,
    pub kind: &'static str,
}

fn preselected(state: &SharedState, query: &ShelterQuery) -> String {
    let shelter = query.shelter.as_deref().unwrap_or_default().trim();
    if state.config.is_known_shelter(shelter) {
        shelter.to_string()
    } else {
        String::new()
    }
}

/// GET /api/v1/resident/leave
pub async fn leave_form(
    State(state): State<SharedState>,
    Query(query): Query<ShelterQuery>,
) -> Json<LeaveForm> {
    Json(LeaveForm {
        shelters: state.config.shelters.clone(),
        shelter: preselected(&state, &query),
        max_days: state.config.max_leave_days,
    })
}

/// POST /api/v1/resident/leave
pub async fn submit_leave(
    State(state): State<SharedState>,
    Json(payload): Json<LeaveSubmission>,
) -> Result<(StatusCode, Json<SubmissionResponse>)> {
    let request = payload.validate(&state.config.shelters, state.config.max_leave_days)?;
    let id = LeaveService::new(state.db.clone()).submit(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            request_id: id,
            kind: "Leave request submitted",
        }),
    ))
}

/// GET /api/v1/resident/transport
pub async fn transport_form(
    State(state): State<SharedState>,
    Query(query): Query<ShelterQuery>,
) -> Json<TransportForm> {
    Json(TransportForm {
        shelters: state.config.shelters.clone(),
        shelter: preselected(&state, &query),
    })
}

/// POST /api/v1/resident/transport
pub async fn submit_transport(
    State(state): State<SharedState>,
    Json(payload): Json<TransportSubmission>,
) -> Result<(StatusCode, Json<SubmissionResponse>)> {
    let request = payload.validate(&state.config.shelters, now_seconds())?;
    let id = TransportService::new(state.db.clone())
        .submit(&request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            request_id: id,
            kind: "Transportation request submitted",
        }),
    ))
}
