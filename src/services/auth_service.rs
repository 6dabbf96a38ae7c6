//! Admin login against stored bcrypt credentials.

use tracing::info;

use crate::{
    auth,
    dto::admin::{LoginRequest, LoginResponse},
    error::ServiceError,
    state::SharedState,
};

/// Authenticate an admin and issue a session token for their group.
///
/// Unknown emails and wrong passwords both collapse to the same
/// "invalid credentials" answer.
pub async fn login(
    state: &SharedState,
    payload: LoginRequest,
) -> Result<LoginResponse, ServiceError> {
    let store = state.store().await?;
    let email = payload.email.trim().to_lowercase();

    let admin = store
        .find_admin_by_email(&email)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".into()))?;

    auth::verify_password(&payload.password, &admin.password_hash)?;

    let token = auth::issue_token(state.config(), admin.id, &admin.email, admin.group_id)?;
    info!(admin_id = %admin.id, group_id = %admin.group_id, "admin logged in");

    Ok(LoginResponse {
        token,
        email: admin.email,
        group_id: admin.group_id,
    })
}
