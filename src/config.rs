//! Application-level configuration loading for the token signing secret.

use std::env;

use tracing::warn;

/// Environment variable carrying the token signing secret.
const JWT_SECRET_ENV: &str = "JWT_SECRET";
/// Development-only fallback secret used when the environment is empty.
const DEV_SECRET: &str = "matchday-dev-secret-change-me";
/// Admin session tokens stay valid for one week.
pub const TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    jwt_secret: String,
}

impl AppConfig {
    /// Load the application configuration from the environment, falling back
    /// to a baked-in development secret when none is set.
    pub fn load() -> Self {
        let jwt_secret = match env::var(JWT_SECRET_ENV) {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                warn!(
                    "{JWT_SECRET_ENV} is not set; using the built-in development secret, \
                     sessions will not survive restarts across deployments"
                );
                DEV_SECRET.to_string()
            }
        };

        Self { jwt_secret }
    }

    /// Build a configuration around an explicit secret (tests).
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }

    /// The secret used to sign and verify admin session tokens.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}
