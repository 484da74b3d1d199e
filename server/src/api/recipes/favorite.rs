use crate::api::views::ShortRecipeResponse;
use crate::api::Id;
use crate::auth::AuthUser;
use crate::error::{ApiError, ConflictResponse, ErrorResponse};
use crate::queries;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to favorites", body = ShortRecipeResponse),
        (status = 400, description = "Already in favorites", body = ConflictResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn add_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Id(id): Id,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), ApiError> {
    let mut conn = state.pool.get()?;
    let recipe = queries::find_recipe(&mut conn, id)?;

    if !queries::add_favorite(&mut conn, user.id, recipe.id)? {
        return Err(ApiError::Conflict("Recipe is already in favorites.".to_string()));
    }
    tracing::debug!(user_id = user.id, recipe_id = recipe.id, "Favorite added");

    Ok((
        StatusCode::CREATED,
        Json(ShortRecipeResponse::new(&recipe, &state.media)),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Not in favorites", body = ConflictResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn remove_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Id(id): Id,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.pool.get()?;
    let recipe = queries::find_recipe(&mut conn, id)?;

    if !queries::remove_favorite(&mut conn, user.id, recipe.id)? {
        return Err(ApiError::Conflict("Recipe is not in favorites.".to_string()));
    }
    tracing::debug!(user_id = user.id, recipe_id = recipe.id, "Favorite removed");

    Ok(StatusCode::NO_CONTENT)
}
