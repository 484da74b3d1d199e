use crate::api::views::{recipe_view, RecipeResponse};
use crate::api::Id;
use crate::auth::OptionalUser;
use crate::error::{ApiError, ErrorResponse};
use crate::queries;
use crate::AppState;
use axum::{extract::State, Json};

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    viewer: OptionalUser,
    State(state): State<AppState>,
    Id(id): Id,
) -> Result<Json<RecipeResponse>, ApiError> {
    let mut conn = state.pool.get()?;
    let recipe = queries::find_recipe(&mut conn, id)?;
    Ok(Json(recipe_view(&mut conn, &state.media, viewer.id(), recipe)?))
}
