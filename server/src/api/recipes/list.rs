use crate::api::pagination::{PageParams, Paginated, RequestUrl};
use crate::api::views::{recipe_views, RecipeResponse};
use crate::auth::OptionalUser;
use crate::error::{ApiError, ErrorResponse};
use crate::queries::{self, RecipeFilter, RecipeOrdering};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use foodgram_core::PageMeta;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RecipeListParams {
    /// Page number, 1-based
    pub page: Option<String>,
    /// Page size (default 6, max 50)
    pub limit: Option<String>,
    /// `1` to show only the caller's favorites
    pub is_favorited: Option<String>,
    /// `1` to show only recipes in the caller's shopping cart
    pub is_in_shopping_cart: Option<String>,
    /// Author ID
    pub author: Option<String>,
    /// Case-insensitive substring of the recipe name or author username
    pub search: Option<String>,
    /// `pub_date`, `-pub_date` (default), `cooking_time` or `-cooking_time`
    pub ordering: Option<String>,
}

fn flag(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1" | "true" | "True"))
}

fn parse_author(value: Option<&str>) -> Result<Option<i32>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ApiError::field("author", "A valid integer is required.")),
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/",
    tag = "recipes",
    params(RecipeListParams),
    responses(
        (status = 200, description = "One page of recipes", body = Paginated<RecipeResponse>),
        (status = 400, description = "Invalid filter value"),
        (status = 404, description = "Invalid page", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    viewer: OptionalUser,
    State(state): State<AppState>,
    RequestUrl(url): RequestUrl,
    Query(params): Query<RecipeListParams>,
) -> Result<Json<Paginated<RecipeResponse>>, ApiError> {
    let page_params = PageParams {
        page: params.page,
        limit: params.limit,
    };
    let request = page_params.request(&state.settings.pages)?;

    let favorited = flag(params.is_favorited.as_deref());
    let in_cart = flag(params.is_in_shopping_cart.as_deref());
    let viewer_id = viewer.id();

    // Per-user filters match nothing for anonymous callers
    if viewer_id.is_none() && (favorited || in_cart) {
        let empty = PageMeta {
            count: 0,
            next: None,
            previous: None,
        };
        return Ok(Json(Paginated::new(empty, Vec::new())));
    }

    let filter = RecipeFilter {
        favorited_by: viewer_id.filter(|_| favorited),
        in_cart_of: viewer_id.filter(|_| in_cart),
        author: parse_author(params.author.as_deref())?,
        search: params.search,
        ordering: RecipeOrdering::parse(params.ordering.as_deref()),
    };

    let mut conn = state.pool.get()?;
    let count = queries::count_recipes(&mut conn, &filter)?;
    let page = request.resolve(count)?;
    let recipes = queries::list_recipes(&mut conn, &filter, page.offset(), page.limit())?;
    let results = recipe_views(&mut conn, &state.media, viewer_id, recipes)?;

    Ok(Json(Paginated::new(page.meta(count, &url), results)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert!(flag(Some("1")));
        assert!(flag(Some("true")));
        assert!(!flag(Some("0")));
        assert!(!flag(Some("")));
        assert!(!flag(None));
    }

    #[test]
    fn test_parse_author() {
        assert_eq!(parse_author(None).unwrap(), None);
        assert_eq!(parse_author(Some(" ")).unwrap(), None);
        assert_eq!(parse_author(Some("12")).unwrap(), Some(12));
        assert!(parse_author(Some("bob")).is_err());
    }
}
