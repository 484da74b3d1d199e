pub mod auth;
pub mod form;
pub mod ingredients;
pub mod lenient;
pub mod pagination;
pub mod recipes;
pub mod users;
pub mod views;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::Router;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::OpenApi;

use crate::error::{ApiError, ConflictResponse, ErrorResponse};
use crate::AppState;

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Foodgram API", description = "Recipes, favorites, shopping lists and subscriptions"),
        components(schemas(
            ErrorResponse,
            ConflictResponse,
            views::UserResponse,
            views::RecipeResponse,
            views::RecipeIngredientResponse,
            views::ShortRecipeResponse,
            views::SubscriptionResponse,
            views::IngredientResponse,
        ))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    // `Authorization: Token <token>`
    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "token_auth",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Token <auth_token>",
            ))),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        auth::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
        ingredients::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

/// Routes mounted under `/api`
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(ingredients::router())
        .merge(recipes::router())
}

/// Integer id path segment. Anything that isn't an id is a 404, like an id
/// that doesn't exist.
pub struct Id(pub i32);

impl<S> FromRequestParts<S> for Id
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<i32>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| Id(id))
            .map_err(|_| ApiError::not_found())
    }
}
