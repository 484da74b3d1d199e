use crate::api::form::FormOrJson;
use crate::auth::AuthUser;
use crate::error::{ApiError, ErrorResponse};
use crate::media::AVATARS_FOLDER;
use crate::queries;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use foodgram_core::error::REQUIRED;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AvatarRequest {
    /// `data:image/<format>;base64,<data>`, or a multipart file part
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar/",
    tag = "users",
    request_body(content(
        (AvatarRequest = "application/json"),
        (AvatarRequest = "multipart/form-data")
    )),
    responses(
        (status = 200, description = "Avatar replaced", body = AvatarResponse),
        (status = 400, description = "Missing or undecodable image"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn set_avatar(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut form: FormOrJson<AvatarRequest>,
) -> Result<Json<AvatarResponse>, ApiError> {
    let inline = form.body.avatar.take();
    let payload = form
        .image("avatar", inline)
        .ok_or_else(|| ApiError::field("avatar", REQUIRED))?;
    let image = payload
        .decode()
        .map_err(|e| ApiError::field("avatar", e.to_string()))?;

    let mut conn = state.pool.get()?;
    let name = state
        .media
        .save(AVATARS_FOLDER, &image)
        .await
        .map_err(|e| ApiError::internal("Failed to store avatar", e))?;

    let replaced = queries::replace_avatar(&mut conn, user.id, Some(&name));
    drop(conn);
    match replaced {
        Ok(Some(previous)) => state.media.remove(&previous).await,
        Ok(None) => {}
        Err(e) => {
            state.media.remove(&name).await;
            return Err(e.into());
        }
    }

    Ok(Json(AvatarResponse {
        avatar: state.media.url(&name),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar/",
    tag = "users",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("token_auth" = [])
    )
)]
pub async fn delete_avatar(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let previous = {
        let mut conn = state.pool.get()?;
        queries::replace_avatar(&mut conn, user.id, None)?
    };
    if let Some(previous) = previous {
        state.media.remove(&previous).await;
    }
    Ok(StatusCode::NO_CONTENT)
}
