use crate::auth::{create_session, verify_password};
use crate::error::{ApiError, ValidJson};
use crate::queries;
use crate::AppState;
use axum::{extract::State, Json};
use foodgram_core::error::REQUIRED;
use foodgram_core::FieldErrors;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub auth_token: String,
}

const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

#[utoipa::path(
    post,
    path = "/api/auth/token/login/",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"email": "cook@example.com", "password": "password"})),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing fields or invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut missing = FieldErrors::new();
    if req.email.is_none() {
        missing.add("email", REQUIRED);
    }
    if req.password.is_none() {
        missing.add("password", REQUIRED);
    }
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::Validation(missing));
    };

    let mut conn = state.pool.get()?;

    let Some(user) = queries::find_user_by_email(&mut conn, email.trim())? else {
        return Err(ApiError::non_field(INVALID_CREDENTIALS));
    };

    if !verify_password(&password, &user.password_hash) {
        return Err(ApiError::non_field(INVALID_CREDENTIALS));
    }

    let auth_token = create_session(&mut conn, user.id, state.settings.session_ttl_days)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse { auth_token }))
}
