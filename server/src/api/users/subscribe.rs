use crate::api::views::{parse_recipes_limit, subscription_views, SubscriptionResponse};
use crate::api::Id;
use crate::auth::AuthUser;
use crate::error::{ApiError, ConflictResponse, ErrorResponse};
use crate::queries;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SubscribeParams {
    /// Maximum number of recipes shown for the author (default: all)
    pub recipes_limit: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe/",
    tag = "users",
    params(
        ("id" = i32, Path, description = "Author ID"),
        SubscribeParams
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Already subscribed, or subscribing to yourself", body = ConflictResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Id(author_id): Id,
    Query(params): Query<SubscribeParams>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), ApiError> {
    let recipes_limit = parse_recipes_limit(params.recipes_limit.as_deref())?;

    let mut conn = state.pool.get()?;
    let author = queries::find_user(&mut conn, author_id)?;

    if author.id == user.id {
        return Err(ApiError::non_field("You can't subscribe to yourself."));
    }
    if !queries::add_subscription(&mut conn, user.id, author.id)? {
        return Err(ApiError::Conflict("Already subscribed.".to_string()));
    }
    tracing::info!(user_id = user.id, author_id = author.id, "Subscribed");

    let view = subscription_views(
        &mut conn,
        &state.media,
        std::slice::from_ref(&author),
        recipes_limit,
    )?
    .pop()
    .ok_or_else(|| ApiError::internal("Subscription view", "empty result"))?;

    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe/",
    tag = "users",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed", body = ConflictResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Id(author_id): Id,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.pool.get()?;
    let author = queries::find_user(&mut conn, author_id)?;

    if !queries::remove_subscription(&mut conn, user.id, author.id)? {
        return Err(ApiError::Conflict("You are not subscribed to this user.".to_string()));
    }
    tracing::info!(user_id = user.id, author_id = author.id, "Unsubscribed");

    Ok(StatusCode::NO_CONTENT)
}
