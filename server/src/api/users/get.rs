use crate::api::views::{user_views, UserResponse};
use crate::api::Id;
use crate::auth::OptionalUser;
use crate::error::{ApiError, ErrorResponse};
use crate::queries;
use crate::AppState;
use axum::{extract::State, Json};

#[utoipa::path(
    get,
    path = "/api/users/{id}/",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    viewer: OptionalUser,
    State(state): State<AppState>,
    Id(id): Id,
) -> Result<Json<UserResponse>, ApiError> {
    let mut conn = state.pool.get()?;
    let user = queries::find_user(&mut conn, id)?;

    let mut views = user_views(
        &mut conn,
        &state.media,
        viewer.id(),
        std::slice::from_ref(&user),
    )?;
    views.pop().map(Json).ok_or_else(ApiError::not_found)
}
