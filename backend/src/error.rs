//! Error type shared by handlers and services.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    /// Pool and transaction failures surfaced with `?`.
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Bad credentials at login.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Missing or unreadable session token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Logged in, but the session may not do this (wrong role, no shelter).
    #[error("Access denied: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The request is no longer in the state the action expects, or a
    /// unique value is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A submitted form with one message per failed rule.
    #[error("Validation error: {}", .0.join(" "))]
    InvalidForm(Vec<String>),

    #[error("Session token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [String]>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        use AppError::*;

        match self {
            Authentication(_) | Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Jwt(_) => (StatusCode::UNAUTHORIZED, "INVALID_SESSION"),
            Authorization(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Validation(_) | InvalidForm(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Database(_) | Sqlx(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            PasswordHash(_) | Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Text shown to residents and staff. Server-side failures get a fixed
    /// message; the detail only goes to the log.
    fn user_message(&self) -> String {
        use AppError::*;

        match self {
            Authentication(msg) | Unauthorized(msg) | Authorization(msg) | NotFound(msg)
            | Conflict(msg) | Validation(msg) => msg.clone(),
            InvalidForm(errors) => errors.join(" "),
            Jwt(_) => "Invalid session.".to_string(),
            Database(_) | Sqlx(_) => "Database operation failed".to_string(),
            Config(_) => "Server configuration error".to_string(),
            PasswordHash(_) | Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
        }

        let body = ErrorBody {
            code,
            message: self.user_message(),
            errors: match &self {
                AppError::InvalidForm(errors) => Some(errors.as_slice()),
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_database_details_stay_in_the_log() {
        let err = AppError::Database("relation \"leave_requests\" does not exist".into());
        assert_eq!(err.user_message(), "Database operation failed");
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_config_details_stay_in_the_log() {
        let err = AppError::Config("SESSION_SECRET is invalid".into());
        assert!(!err.user_message().contains("SESSION_SECRET"));
    }

    #[test]
    fn test_workflow_messages_pass_through() {
        let cases = [
            (AppError::Conflict("Not pending.".into()), StatusCode::CONFLICT),
            (
                AppError::Authorization("Select a shelter first.".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::NotFound("Resident not found.".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Authentication("Invalid login.".into()),
                StatusCode::UNAUTHORIZED,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_and_code().0, status);
            assert!(err.user_message().ends_with('.'));
        }
    }

    #[test]
    fn test_garbage_token_maps_to_invalid_session() {
        let decoded = jsonwebtoken::decode::<serde_json::Value>(
            "not.a.token",
            &jsonwebtoken::DecodingKey::from_secret(b"k"),
            &jsonwebtoken::Validation::default(),
        );
        let err: AppError = decoded.unwrap_err().into();
        assert_eq!(
            err.status_and_code(),
            (StatusCode::UNAUTHORIZED, "INVALID_SESSION")
        );
        assert_eq!(err.user_message(), "Invalid session.");
    }

    #[tokio::test]
    async fn test_form_errors_are_listed() {
        let err = AppError::InvalidForm(vec![
            "You must accept the agreement.".into(),
            "Invalid date or time.".into(),
        ]);
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["message"],
            "You must accept the agreement. Invalid date or time."
        );
    }

    #[tokio::test]
    async fn test_single_errors_have_no_list() {
        let (status, body) = body_json(AppError::Validation("Invalid role.".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("errors").is_none());
        assert_eq!(body["message"], "Invalid role.");
    }
}
