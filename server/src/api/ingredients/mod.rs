pub mod get;
pub mod list;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Read-only ingredient catalogue (mounted under /api)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingredients/", get(list::list_ingredients))
        .route("/ingredients/{id}/", get(get::get_ingredient))
}

#[derive(OpenApi)]
#[openapi(paths(list::list_ingredients, get::get_ingredient))]
pub struct ApiDoc;
