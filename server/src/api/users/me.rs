use crate::api::views::UserResponse;
use crate::auth::AuthUser;
use crate::error::ErrorResponse;
use crate::AppState;
use axum::{extract::State, Json};

#[utoipa::path(
    get,
    path = "/api/users/me/",
    tag = "users",
    responses(
        (status = 200, description = "The caller's profile", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn me(AuthUser(user): AuthUser, State(state): State<AppState>) -> Json<UserResponse> {
    // Nobody can follow themselves
    Json(UserResponse::new(&user, false, &state.media))
}
