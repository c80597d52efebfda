//! HTTP API: shared state, route table, and middleware stack.

pub mod handlers;
pub mod middleware;
pub mod validation;

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    response::Redirect,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::services::auth_service::AuthService;

use self::handlers::{
    admin, attendance, auth, health, leave, resident_portal, residents, transport,
};
use self::middleware::auth::require_auth;
use self::middleware::request_id::request_id;

/// Application state shared by every handler.
pub struct AppState {
    pub config: Config,
    pub db: PgPool,
    pub auth: AuthService,
    /// `None` when no Prometheus recorder is installed (tests).
    pub metrics: Option<PrometheusHandle>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: Config, db: PgPool, metrics: Option<PrometheusHandle>) -> Self {
        let auth = AuthService::new(&config);
        Self {
            config,
            db,
            auth,
            metrics,
        }
    }
}

/// Build the full application router.
pub fn create_router(state: SharedState) -> Router {
    let auth_layer = from_fn_with_state(state.clone(), require_auth);

    let staff_protected = Router::new()
        .merge(auth::router())
        .nest("/leave", leave::router())
        .nest("/transport", transport::router())
        .nest("/attendance", attendance::router())
        .nest("/residents", residents::router())
        .route_layer(auth_layer.clone());

    let staff = Router::new()
        .merge(auth::public_router())
        .merge(staff_protected);

    let admin = admin::router().route_layer(auth_layer);

    Router::new()
        .route("/", get(|| async { Redirect::to("/api/v1/resident/leave") }))
        .merge(health::router())
        .nest("/api/v1/resident", resident_portal::router())
        .nest("/api/v1/staff", staff)
        .nest("/api/v1/admin", admin)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn state() -> SharedState {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://x@127.0.0.1:1/x".to_string()),
            _ => None,
        })
        .unwrap();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        Arc::new(AppState::new(config, db, None))
    }

    #[tokio::test]
    async fn test_metrics_not_found_without_recorder() {
        let response = create_router(state())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = create_router(state())
            .oneshot(Request::get("/api/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = create_router(state())
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
