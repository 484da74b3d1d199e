use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::{ApiError, ErrorResponse, ValidJson};
use crate::queries;
use crate::AppState;
use axum::{extract::State, http::StatusCode};
use foodgram_core::SetPassword;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SetPasswordRequest {
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/users/set_password/",
    tag = "users",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Missing field or wrong current password"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn set_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ValidJson(req): ValidJson<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let change = SetPassword {
        new_password: req.new_password,
        current_password: req.current_password,
    }
    .validate()?;

    if !verify_password(&change.current_password, &user.password_hash) {
        return Err(ApiError::field("current_password", "Invalid password."));
    }

    let password_hash = hash_password(&change.new_password)
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;

    let mut conn = state.pool.get()?;
    queries::set_password_hash(&mut conn, user.id, &password_hash)?;
    tracing::info!(user_id = user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}
