//! Session authentication middleware and per-request staff identity.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::staff_user::Role;
use crate::services::auth_service::{bearer_token, Claims};

/// Identity of the logged-in staff member, inserted into request extensions
/// by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub staff_user_id: i64,
    pub username: String,
    pub role: Role,
    pub is_admin: bool,
    pub shelter: Option<String>,
    pub claims: Claims,
}

impl From<Claims> for AuthExtension {
    fn from(claims: Claims) -> Self {
        Self {
            staff_user_id: claims.sub,
            username: claims.username.clone(),
            role: claims.role,
            is_admin: claims.role == Role::Admin,
            shelter: claims.shelter.clone(),
            claims,
        }
    }
}

impl AuthExtension {
    /// The shelter selected for this session. Every staff view is scoped to it.
    pub fn require_shelter(&self) -> Result<&str> {
        self.shelter
            .as_deref()
            .ok_or_else(|| AppError::Authorization("Select a shelter first.".to_string()))
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Admin only.".to_string()))
        }
    }
}

/// Reject requests without a valid session token.
pub async fn require_auth(
    State(state): State<SharedState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let claims = match authenticate(&state, &request) {
        Ok(claims) => claims,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(AuthExtension::from(claims));
    next.run(request).await
}

fn authenticate(state: &SharedState, request: &Request<Body>) -> Result<Claims> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Login required.".to_string()))?;

    state.auth.validate(bearer_token(header)?)
}
