use crate::api::views::IngredientResponse;
use crate::api::Id;
use crate::error::{ApiError, ErrorResponse};
use crate::queries;
use crate::AppState;
use axum::{extract::State, Json};

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}/",
    tag = "ingredients",
    params(
        ("id" = i32, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Id(id): Id,
) -> Result<Json<IngredientResponse>, ApiError> {
    let mut conn = state.pool.get()?;
    let ingredient = queries::find_ingredient(&mut conn, id)?;
    Ok(Json(ingredient.into()))
}
