use crate::api::form::FormOrJson;
use crate::api::lenient;
use crate::api::views::{recipe_view, RecipeResponse};
use crate::api::Id;
use crate::auth::AuthUser;
use crate::error::{ApiError, ErrorResponse};
use crate::media::RECIPES_FOLDER;
use crate::models::{Recipe, RecipeChangeset};
use crate::queries;
use crate::schema::recipes;
use crate::AppState;
use axum::{extract::State, Json};
use diesel::prelude::*;
use foodgram_core::UpdateRecipe;
use serde::Deserialize;
use utoipa::ToSchema;

use super::create::IngredientAmountRequest;
use super::{check_ingredients_exist, owned_recipe};

/// Partial update. `ingredients` is required and replaces the whole list.
/// Accepts the same JSON and multipart shapes as creation.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub cooking_time: Option<i64>,
    pub image: Option<String>,
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body(content(
        (UpdateRecipeRequest = "application/json"),
        (UpdateRecipeRequest = "multipart/form-data")
    )),
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Field-keyed validation errors"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Id(id): Id,
    mut form: FormOrJson<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let req = std::mem::take(&mut form.body);
    let mut conn = state.pool.get()?;
    let existing = owned_recipe(&mut conn, id, &user)?;

    let changes = UpdateRecipe {
        name: req.name,
        text: req.text,
        cooking_time: req.cooking_time,
        image: form.image("image", req.image),
        ingredients: req
            .ingredients
            .map(|list| list.into_iter().map(Into::into).collect()),
    }
    .validate()?;
    check_ingredients_exist(&mut conn, &changes.items)?;

    let new_image = match &changes.image {
        Some(image) => Some(
            state
                .media
                .save(RECIPES_FOLDER, image)
                .await
                .map_err(|e| ApiError::internal("Failed to store recipe image", e))?,
        ),
        None => None,
    };

    let changeset = RecipeChangeset {
        name: changes.name.as_deref(),
        image: new_image.as_deref(),
        text: changes.text.as_deref(),
        cooking_time: changes.cooking_time,
    };
    let has_changes = changeset.name.is_some()
        || changeset.image.is_some()
        || changeset.text.is_some()
        || changeset.cooking_time.is_some();

    let updated = conn.transaction::<_, ApiError, _>(|conn| {
        let recipe = if has_changes {
            diesel::update(recipes::table.find(existing.id))
                .set(&changeset)
                .returning(Recipe::as_returning())
                .get_result(conn)?
        } else {
            existing.clone()
        };
        queries::set_recipe_items(conn, recipe.id, &changes.items)?;
        Ok(recipe)
    });

    let updated = match updated {
        Ok(updated) => {
            if new_image.is_some() {
                state.media.remove(&existing.image).await;
            }
            updated
        }
        Err(e) => {
            if let Some(name) = &new_image {
                state.media.remove(name).await;
            }
            return Err(e);
        }
    };
    tracing::info!(recipe_id = updated.id, author_id = user.id, "Recipe updated");

    Ok(Json(recipe_view(&mut conn, &state.media, Some(user.id), updated)?))
}
