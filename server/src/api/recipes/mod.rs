pub mod create;
pub mod delete;
pub mod download;
pub mod favorite;
pub mod get;
pub mod get_link;
pub mod list;
pub mod shopping_cart;
pub mod update;

use crate::error::ApiError;
use crate::models::{Recipe, User};
use crate::queries;
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use diesel::PgConnection;
use foodgram_core::RecipeItem;
use utoipa::OpenApi;

/// Returns the router for recipe endpoints (mounted under /api)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes/", get(list::list_recipes).post(create::create_recipe))
        .route(
            "/recipes/download_shopping_cart/",
            get(download::download_shopping_cart),
        )
        .route(
            "/recipes/{id}/",
            get(get::get_recipe)
                .patch(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .route("/recipes/{id}/get-link/", get(get_link::get_link))
        .route(
            "/recipes/{id}/favorite/",
            post(favorite::add_favorite).delete(favorite::remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(shopping_cart::add_to_cart).delete(shopping_cart::remove_from_cart),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe,
        list::list_recipes,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
        favorite::add_favorite,
        favorite::remove_favorite,
        shopping_cart::add_to_cart,
        shopping_cart::remove_from_cart,
        download::download_shopping_cart,
        get_link::get_link,
    ),
    components(schemas(
        create::CreateRecipeRequest,
        create::IngredientAmountRequest,
        update::UpdateRecipeRequest,
        get_link::ShortLinkResponse,
    ))
)]
pub struct ApiDoc;

/// Every ingredient id must exist in the catalogue.
fn check_ingredients_exist(conn: &mut PgConnection, items: &[RecipeItem]) -> Result<(), ApiError> {
    let ids: Vec<i32> = items.iter().map(|i| i.ingredient_id).collect();
    let existing = queries::existing_ingredient_ids(conn, &ids)?;

    let mut errors = foodgram_core::FieldErrors::new();
    for id in ids.iter().filter(|id| !existing.contains(id)) {
        errors.add("ingredients", format!("Ingredient {id} does not exist."));
    }
    Ok(errors.finish(())?)
}

/// Load a recipe the caller is about to modify.
fn owned_recipe(conn: &mut PgConnection, id: i32, user: &User) -> Result<Recipe, ApiError> {
    let recipe = queries::find_recipe(conn, id)?;
    if recipe.author_id != user.id {
        tracing::warn!(user_id = user.id, recipe_id = id, "Refused change to another author's recipe");
        return Err(ApiError::Forbidden);
    }
    Ok(recipe)
}
