use crate::api::pagination::{Paginated, RequestUrl};
use crate::api::views::{parse_recipes_limit, subscription_views, SubscriptionResponse};
use crate::auth::AuthUser;
use crate::error::{ApiError, ErrorResponse};
use crate::queries;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use foodgram_core::PageRequest;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SubscriptionParams {
    /// Page number, 1-based
    pub page: Option<String>,
    /// Page size (default 6, max 50)
    pub limit: Option<String>,
    /// Maximum number of recipes shown per author (default: all)
    pub recipes_limit: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions/",
    tag = "users",
    params(SubscriptionParams),
    responses(
        (status = 200, description = "Followed authors", body = Paginated<SubscriptionResponse>),
        (status = 400, description = "Invalid recipes_limit"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    RequestUrl(url): RequestUrl,
    Query(params): Query<SubscriptionParams>,
) -> Result<Json<Paginated<SubscriptionResponse>>, ApiError> {
    let recipes_limit = parse_recipes_limit(params.recipes_limit.as_deref())?;
    let page = PageRequest::parse(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.settings.pages,
    )?;

    let mut conn = state.pool.get()?;
    let count = queries::count_subscriptions(&mut conn, user.id)?;
    let page = page.resolve(count)?;
    let authors = queries::subscribed_authors(&mut conn, user.id, page.offset(), page.limit())?;
    let results = subscription_views(&mut conn, &state.media, &authors, recipes_limit)?;

    Ok(Json(Paginated::new(page.meta(count, &url), results)))
}
