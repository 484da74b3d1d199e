use crate::auth::AuthUser;
use crate::error::{ApiError, ErrorResponse};
use crate::queries;
use crate::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use foodgram_core::{aggregate, render_pdf};

const FILENAME: &str = "shopping_list.pdf";

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart/",
    tag = "recipes",
    responses(
        (status = 200, description = "Shopping list PDF", content_type = "application/pdf"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let entries = {
        let mut conn = state.pool.get()?;
        queries::cart_entries(&mut conn, user.id)?
    };

    let items = aggregate(entries);
    let pdf = render_pdf(&items).map_err(|e| ApiError::internal("Failed to render shopping list", e))?;
    tracing::info!(user_id = user.id, items = items.len(), bytes = pdf.len(), "Shopping list rendered");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{FILENAME}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}
