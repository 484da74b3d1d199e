use crate::auth::{delete_session, parse_authorization, AuthHeader, AuthUser};
use crate::error::{ApiError, ErrorResponse};
use crate::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};

#[utoipa::path(
    post,
    path = "/api/auth/token/logout/",
    tag = "auth",
    responses(
        (status = 204, description = "Session closed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    // AuthUser already accepted this header
    let AuthHeader::Token(token) = parse_authorization(&headers) else {
        return Err(ApiError::not_authenticated());
    };

    let mut conn = state.pool.get()?;
    delete_session(&mut conn, token)?;
    tracing::info!(user_id = user.id, "User logged out");

    Ok(StatusCode::NO_CONTENT)
}
