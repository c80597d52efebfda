//! Liveness, database diagnostics, and Prometheus scrape endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health))
        .route("/debug/db", get(debug_db))
        .route("/metrics", get(metrics))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Debug, Serialize)]
pub struct DbDiagnostics {
    pub ok: bool,
    pub db_kind: &'static str,
    pub database_url_set: bool,
    pub deployment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /debug/db - confirm the database answers queries.
pub async fn debug_db(State(state): State<SharedState>) -> (StatusCode, Json<DbDiagnostics>) {
    let ping = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await;

    let mut diagnostics = DbDiagnostics {
        ok: true,
        db_kind: "postgres",
        database_url_set: !state.config.database_url.is_empty(),
        deployment_id: state.config.deployment_id.clone(),
        error: None,
    };

    match ping {
        Ok(_) => (StatusCode::OK, Json(diagnostics)),
        Err(e) => {
            tracing::error!(error = %e, "Database diagnostics failed");
            diagnostics.ok = false;
            diagnostics.error = Some("Database unreachable".to_string());
            (StatusCode::INTERNAL_SERVER_ERROR, Json(diagnostics))
        }
    }
}

/// GET /metrics
pub async fn metrics(State(state): State<SharedState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
