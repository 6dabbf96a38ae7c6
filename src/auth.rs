//! Admin session tokens and the bearer-auth middleware.
//!
//! Tokens are signed JWTs carrying the admin's identity and the single group
//! the account manages. Every handler behind the middleware reads the group
//! from the verified claims, never from the request payload, which is what
//! keeps tenants isolated from each other.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, TOKEN_TTL_SECS},
    error::{AppError, ServiceError},
    state::SharedState,
};

/// Claims embedded in an admin session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Admin account identifier.
    pub sub: Uuid,
    /// Admin login email.
    pub email: String,
    /// The one group this session may manage.
    pub group_id: Uuid,
    /// Expiry as a unix timestamp.
    pub exp: u64,
}

/// Verified admin identity attached to the request by [`require_admin`].
#[derive(Debug, Clone)]
pub struct AdminContext {
    /// Admin account identifier.
    pub admin_id: Uuid,
    /// Admin login email.
    pub email: String,
    /// The group this session is scoped to.
    pub group_id: Uuid,
}

impl From<AdminClaims> for AdminContext {
    fn from(claims: AdminClaims) -> Self {
        Self {
            admin_id: claims.sub,
            email: claims.email,
            group_id: claims.group_id,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Sign a week-long session token for a freshly authenticated admin.
pub fn issue_token(
    config: &AppConfig,
    admin_id: Uuid,
    email: &str,
    group_id: Uuid,
) -> Result<String, ServiceError> {
    let claims = AdminClaims {
        sub: admin_id,
        email: email.to_string(),
        group_id,
        exp: unix_now() + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret()),
    )
    .map_err(|err| ServiceError::InvalidInput(format!("failed to sign session token: {err}")))
}

/// Verify a bearer token and return its claims, rejecting expired sessions.
pub fn verify_token(config: &AppConfig, token: &str) -> Result<AdminClaims, ServiceError> {
    decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ServiceError::Unauthorized("invalid or expired session token".into()))
}

/// Check a plaintext password against a stored bcrypt hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), ServiceError> {
    match bcrypt::verify(password, password_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ServiceError::Unauthorized("invalid credentials".into())),
        Err(err) => Err(ServiceError::InvalidInput(format!(
            "stored password hash is unreadable: {err}"
        ))),
    }
}

/// Middleware guarding the admin router: extracts the bearer token, verifies
/// it and attaches an [`AdminContext`] as a request extension.
pub async fn require_admin(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

    let claims = verify_token(state.config(), &token).map_err(AppError::from)?;
    req.extensions_mut().insert(AdminContext::from(claims));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig::with_secret("unit-test-secret")
    }

    #[test]
    fn token_round_trips_claims() {
        let config = test_config();
        let admin_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();

        let token = issue_token(&config, admin_id, "boss@example.com", group_id).unwrap();
        let claims = verify_token(&config, &token).unwrap();

        assert_eq!(claims.sub, admin_id);
        assert_eq!(claims.email, "boss@example.com");
        assert_eq!(claims.group_id, group_id);
        assert!(claims.exp > unix_now());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token(
            &AppConfig::with_secret("secret-a"),
            Uuid::new_v4(),
            "boss@example.com",
            Uuid::new_v4(),
        )
        .unwrap();

        let err = verify_token(&AppConfig::with_secret("secret-b"), &token).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let err = verify_token(&test_config(), "not-a-token").unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn password_verification_accepts_matching_hash() {
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
