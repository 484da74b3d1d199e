use crate::api::Id;
use crate::auth::AuthUser;
use crate::error::{ApiError, ErrorResponse};
use crate::schema::recipes;
use crate::AppState;
use axum::{extract::State, http::StatusCode};
use diesel::prelude::*;

use super::owned_recipe;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Id(id): Id,
) -> Result<StatusCode, ApiError> {
    let recipe = {
        let mut conn = state.pool.get()?;
        let recipe = owned_recipe(&mut conn, id, &user)?;
        diesel::delete(recipes::table.find(recipe.id)).execute(&mut conn)?;
        recipe
    };
    state.media.remove(&recipe.image).await;
    tracing::info!(recipe_id = recipe.id, author_id = user.id, "Recipe deleted");

    Ok(StatusCode::NO_CONTENT)
}
