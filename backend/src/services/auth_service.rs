//! Password hashing and session tokens.
//!
//! A session token is an HS256 JWT carrying the staff identity and, once the
//! staff member has picked one, the shelter every staff view is scoped to.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::staff_user::Role;

/// Claims stored in a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Staff user id
    pub sub: i64,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelter: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Issued token plus its expiry, returned to clients on login.
#[derive(Debug, Serialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: i64,
}

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        Self::with_secret(
            config.session_secret.as_bytes(),
            Duration::hours(config.session_ttl_hours),
            config.bcrypt_cost,
        )
    }

    pub fn with_secret(secret: &[u8], ttl: Duration, bcrypt_cost: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
            bcrypt_cost,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        Ok(bcrypt::hash(password, self.bcrypt_cost)?)
    }

    /// Check a password against a stored hash. A malformed hash counts as a
    /// mismatch rather than a server error.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Issue a session token for a staff member, optionally scoped to a shelter.
    pub fn issue(
        &self,
        staff_user_id: i64,
        username: &str,
        role: Role,
        shelter: Option<String>,
    ) -> Result<SessionToken> {
        let now = Utc::now();
        let exp = (now + self.ttl).timestamp();
        let claims = Claims {
            sub: staff_user_id,
            username: username.to_string(),
            role,
            shelter,
            iat: now.timestamp(),
            exp,
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(SessionToken {
            token,
            expires_at: exp,
        })
    }

    /// Re-issue the token of an existing session with a different shelter.
    pub fn with_shelter(&self, claims: &Claims, shelter: &str) -> Result<SessionToken> {
        self.issue(
            claims.sub,
            &claims.username,
            claims.role,
            Some(shelter.to_string()),
        )
    }

    pub fn validate(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Result<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Login required.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::with_secret(b"test-secret", Duration::hours(1), 4)
    }

    #[test]
    fn test_password_hash_and_verify() {
        let svc = service();
        let hash = svc.hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(svc.verify_password("hunter2", &hash));
        assert!(!svc.verify_password("hunter3", &hash));
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        assert!(!service().verify_password("anything", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_token_round_trip_without_shelter() {
        let svc = service();
        let issued = svc.issue(5, "dana", Role::Staff, None).unwrap();
        let claims = svc.validate(&issued.token).unwrap();
        assert_eq!(claims.sub, 5);
        assert_eq!(claims.username, "dana");
        assert_eq!(claims.role, Role::Staff);
        assert!(claims.shelter.is_none());
        assert_eq!(claims.exp, issued.expires_at);
    }

    #[test]
    fn test_with_shelter_keeps_identity() {
        let svc = service();
        let issued = svc.issue(9, "root", Role::Admin, None).unwrap();
        let claims = svc.validate(&issued.token).unwrap();

        let scoped = svc.with_shelter(&claims, "Haven").unwrap();
        let scoped_claims = svc.validate(&scoped.token).unwrap();
        assert_eq!(scoped_claims.sub, 9);
        assert_eq!(scoped_claims.role, Role::Admin);
        assert_eq!(scoped_claims.shelter.as_deref(), Some("Haven"));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = AuthService::with_secret(b"other-secret", Duration::hours(1), 4);
        let issued = other.issue(1, "eve", Role::Admin, None).unwrap();
        assert!(matches!(service().validate(&issued.token), Err(AppError::Jwt(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = AuthService::with_secret(b"test-secret", Duration::hours(-2), 4);
        let issued = svc.issue(1, "old", Role::Staff, None).unwrap();
        assert!(svc.validate(&issued.token).is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def").unwrap(), "abc.def");
        assert!(bearer_token("Basic abc").is_err());
        assert!(bearer_token("Bearer ").is_err());
    }
}
