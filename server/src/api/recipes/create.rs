use crate::api::form::FormOrJson;
use crate::api::lenient;
use crate::api::views::{recipe_view, RecipeResponse};
use crate::auth::AuthUser;
use crate::error::{ApiError, ErrorResponse};
use crate::media::RECIPES_FOLDER;
use crate::models::{NewRecipe, Recipe};
use crate::queries;
use crate::schema::recipes;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use foodgram_core::{CreateRecipe, IngredientAmount};
use serde::Deserialize;
use utoipa::ToSchema;

use super::check_ingredients_exist;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct IngredientAmountRequest {
    /// Ingredient ID
    #[serde(deserialize_with = "lenient::integer")]
    pub id: i32,
    /// Between 1 and 32000
    #[serde(deserialize_with = "lenient::integer")]
    pub amount: i64,
}

impl From<IngredientAmountRequest> for IngredientAmount {
    fn from(req: IngredientAmountRequest) -> Self {
        IngredientAmount {
            id: req.id,
            amount: req.amount,
        }
    }
}

/// Sent as JSON, or as `multipart/form-data` with `image` as a file part and
/// `ingredients` as a JSON-encoded text part.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    /// Minutes, between 1 and 32000
    #[serde(default, deserialize_with = "lenient::optional_integer")]
    pub cooking_time: Option<i64>,
    /// `data:image/<format>;base64,<data>`, or the uploaded file
    pub image: Option<String>,
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
}

#[utoipa::path(
    post,
    path = "/api/recipes/",
    tag = "recipes",
    request_body(content(
        (CreateRecipeRequest = "application/json"),
        (CreateRecipeRequest = "multipart/form-data")
    )),
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Field-keyed validation errors"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut form: FormOrJson<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    let req = std::mem::take(&mut form.body);
    let recipe = CreateRecipe {
        name: req.name,
        text: req.text,
        cooking_time: req.cooking_time,
        image: form.image("image", req.image),
        ingredients: req
            .ingredients
            .map(|list| list.into_iter().map(Into::into).collect()),
    }
    .validate()?;

    let mut conn = state.pool.get()?;
    check_ingredients_exist(&mut conn, &recipe.items)?;

    let image_name = state
        .media
        .save(RECIPES_FOLDER, &recipe.image)
        .await
        .map_err(|e| ApiError::internal("Failed to store recipe image", e))?;

    let created = conn.transaction::<_, ApiError, _>(|conn| {
        let created = diesel::insert_into(recipes::table)
            .values(NewRecipe {
                author_id: user.id,
                name: &recipe.name,
                image: &image_name,
                text: &recipe.text,
                cooking_time: recipe.cooking_time,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;
        queries::set_recipe_items(conn, created.id, &recipe.items)?;
        Ok(created)
    });

    let created = match created {
        Ok(created) => created,
        Err(e) => {
            state.media.remove(&image_name).await;
            return Err(e);
        }
    };
    tracing::info!(recipe_id = created.id, author_id = user.id, "Recipe created");

    let view = recipe_view(&mut conn, &state.media, Some(user.id), created)?;
    Ok((StatusCode::CREATED, Json(view)))
}
