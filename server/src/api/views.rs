//! Response shapes shared by several endpoints, and the batch loaders that
//! fill them in.

use diesel::PgConnection;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::media::MediaStore;
use crate::models::{Ingredient, Recipe, User};
use crate::queries;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the caller follows this user (always false for anonymous callers)
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserResponse {
    pub fn new(user: &User, is_subscribed: bool, media: &MediaStore) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.as_deref().map(|a| media.url(a)),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            measurement_unit: i.measurement_unit,
        }
    }
}

/// An ingredient line of a recipe.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    /// Ingredient id
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Compact recipe view used by favorites, the cart and subscriptions.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortRecipeResponse {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl ShortRecipeResponse {
    pub fn new(recipe: &Recipe, media: &MediaStore) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: media.url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// A followed author with a preview of their recipes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserResponse,
    pub recipes: Vec<ShortRecipeResponse>,
    pub recipes_count: i64,
}

/// User views relative to `viewer`.
pub fn user_views(
    conn: &mut PgConnection,
    media: &MediaStore,
    viewer: Option<i32>,
    users: &[User],
) -> Result<Vec<UserResponse>, ApiError> {
    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let subscribed = queries::subscribed_among(conn, viewer, &ids)?;
    Ok(users
        .iter()
        .map(|u| UserResponse::new(u, subscribed.contains(&u.id), media))
        .collect())
}

/// Fully hydrated recipe views relative to `viewer`, in input order.
pub fn recipe_views(
    conn: &mut PgConnection,
    media: &MediaStore,
    viewer: Option<i32>,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeResponse>, ApiError> {
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors = queries::users_by_ids(conn, &author_ids)?;
    let subscribed = queries::subscribed_among(conn, viewer, &author_ids)?;
    let mut items = queries::recipe_items(conn, &recipe_ids)?;
    let favorited = queries::favorited_among(conn, viewer, &recipe_ids)?;
    let in_cart = queries::in_cart_among(conn, viewer, &recipe_ids)?;

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors.get(&recipe.author_id).ok_or_else(|| {
                ApiError::internal(
                    "Recipe author missing",
                    format!("recipe {} author {}", recipe.id, recipe.author_id),
                )
            })?;
            let ingredients = items
                .remove(&recipe.id)
                .unwrap_or_default()
                .into_iter()
                .map(|(ingredient, amount)| RecipeIngredientResponse {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount,
                })
                .collect();

            Ok(RecipeResponse {
                id: recipe.id,
                author: UserResponse::new(author, subscribed.contains(&author.id), media),
                ingredients,
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                image: media.url(&recipe.image),
                name: recipe.name,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

pub fn recipe_view(
    conn: &mut PgConnection,
    media: &MediaStore,
    viewer: Option<i32>,
    recipe: Recipe,
) -> Result<RecipeResponse, ApiError> {
    recipe_views(conn, media, viewer, vec![recipe])?
        .pop()
        .ok_or_else(|| ApiError::internal("Recipe hydration", "empty result"))
}

/// Subscription views for authors the caller follows.
pub fn subscription_views(
    conn: &mut PgConnection,
    media: &MediaStore,
    authors: &[User],
    recipes_limit: Option<i64>,
) -> Result<Vec<SubscriptionResponse>, ApiError> {
    let ids: Vec<i32> = authors.iter().map(|u| u.id).collect();
    let mut recipes = queries::recipes_by_authors(conn, &ids, recipes_limit)?;
    let counts = queries::recipe_counts(conn, &ids)?;

    Ok(authors
        .iter()
        .map(|author| SubscriptionResponse {
            author: UserResponse::new(author, true, media),
            recipes: recipes
                .remove(&author.id)
                .unwrap_or_default()
                .iter()
                .map(|r| ShortRecipeResponse::new(r, media))
                .collect(),
            recipes_count: counts.get(&author.id).copied().unwrap_or(0),
        })
        .collect())
}

/// Parse the `recipes_limit` query value: a non-negative integer.
pub fn parse_recipes_limit(value: Option<&str>) -> Result<Option<i64>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .map(Some)
            .ok_or_else(|| {
                ApiError::field("recipes_limit", "A valid non-negative integer is required.")
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(avatar: Option<&str>) -> User {
        User {
            id: 7,
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Smith".to_string(),
            password_hash: "$argon2id$...".to_string(),
            avatar: avatar.map(str::to_string),
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_user_view_hides_password_and_links_avatar() {
        let media = MediaStore::new("media", "/media/");
        let view = UserResponse::new(&user(Some("avatars/a.png")), false, &media);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["avatar"], "/media/avatars/a.png");
        assert!(json.get("password_hash").is_none());

        let view = UserResponse::new(&user(None), true, &media);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json["avatar"].is_null());
        assert_eq!(json["is_subscribed"], true);
    }

    #[test]
    fn test_subscription_view_is_flat() {
        let media = MediaStore::new("media", "/media/");
        let view = SubscriptionResponse {
            author: UserResponse::new(&user(None), true, &media),
            recipes: vec![],
            recipes_count: 3,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["username"], "cook");
        assert_eq!(json["recipes_count"], 3);
        assert!(json.get("author").is_none());
    }

    #[test]
    fn test_recipes_limit() {
        assert_eq!(parse_recipes_limit(None).unwrap(), None);
        assert_eq!(parse_recipes_limit(Some("")).unwrap(), None);
        assert_eq!(parse_recipes_limit(Some("3")).unwrap(), Some(3));
        assert_eq!(parse_recipes_limit(Some("0")).unwrap(), Some(0));
        assert!(parse_recipes_limit(Some("three")).is_err());
        assert!(parse_recipes_limit(Some("-1")).is_err());
    }
}
