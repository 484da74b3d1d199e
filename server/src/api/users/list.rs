use crate::api::pagination::{PageParams, Paginated, RequestUrl};
use crate::api::views::{user_views, UserResponse};
use crate::auth::OptionalUser;
use crate::error::{ApiError, ErrorResponse};
use crate::queries;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};

#[utoipa::path(
    get,
    path = "/api/users/",
    tag = "users",
    params(PageParams),
    responses(
        (status = 200, description = "One page of users", body = Paginated<UserResponse>),
        (status = 404, description = "Invalid page", body = ErrorResponse)
    )
)]
pub async fn list_users(
    viewer: OptionalUser,
    State(state): State<AppState>,
    RequestUrl(url): RequestUrl,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<UserResponse>>, ApiError> {
    let mut conn = state.pool.get()?;

    let count = queries::count_users(&mut conn)?;
    let page = params.request(&state.settings.pages)?.resolve(count)?;
    let users = queries::list_users(&mut conn, page.offset(), page.limit())?;
    let results = user_views(&mut conn, &state.media, viewer.id(), &users)?;

    Ok(Json(Paginated::new(page.meta(count, &url), results)))
}
