use crate::api::Id;
use crate::error::{ApiError, ErrorResponse};
use crate::queries;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

pub fn short_link(base: &str, recipe_id: i32) -> String {
    format!("{}/s/{}", base.trim_end_matches('/'), recipe_id)
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Short link to the recipe", body = ShortLinkResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_link(
    State(state): State<AppState>,
    Id(id): Id,
) -> Result<Json<ShortLinkResponse>, ApiError> {
    let mut conn = state.pool.get()?;
    let recipe = queries::find_recipe(&mut conn, id)?;

    Ok(Json(ShortLinkResponse {
        short_link: short_link(&state.settings.short_link_base, recipe.id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_link_format() {
        assert_eq!(short_link("https://foodgram.example", 5), "https://foodgram.example/s/5");
        assert_eq!(short_link("https://foodgram.example/", 5), "https://foodgram.example/s/5");
    }

    #[test]
    fn test_short_link_key_is_hyphenated() {
        let json = serde_json::to_value(ShortLinkResponse {
            short_link: "x/s/1".to_string(),
        })
        .unwrap();
        assert_eq!(json["short-link"], "x/s/1");
    }
}
