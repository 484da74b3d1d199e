pub mod avatar;
pub mod get;
pub mod list;
pub mod me;
pub mod register;
pub mod set_password;
pub mod subscribe;
pub mod subscriptions;

use crate::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for user endpoints (mounted under /api)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list::list_users).post(register::register))
        .route("/users/me/", get(me::me))
        .route(
            "/users/me/avatar/",
            put(avatar::set_avatar).delete(avatar::delete_avatar),
        )
        .route("/users/set_password/", post(set_password::set_password))
        .route("/users/subscriptions/", get(subscriptions::list_subscriptions))
        .route("/users/{id}/", get(get::get_user))
        .route(
            "/users/{id}/subscribe/",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        register::register,
        list::list_users,
        get::get_user,
        me::me,
        set_password::set_password,
        avatar::set_avatar,
        avatar::delete_avatar,
        subscriptions::list_subscriptions,
        subscribe::subscribe,
        subscribe::unsubscribe,
    ),
    components(schemas(
        register::RegisterRequest,
        register::RegisterResponse,
        set_password::SetPasswordRequest,
        avatar::AvatarRequest,
        avatar::AvatarResponse,
    ))
)]
pub struct ApiDoc;
