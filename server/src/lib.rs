pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod queries;
pub mod raw_sql;
pub mod schema;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, FromRef, MatchedPath};
use axum::http::Request;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

pub use config::Settings;
pub use db::DbPool;
pub use media::MediaStore;

/// Room for a maximum-size image after base64 inflation.
const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Application state shared across all handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub settings: Arc<Settings>,
    pub media: Arc<MediaStore>,
}

impl AppState {
    pub fn new(pool: DbPool, settings: Settings) -> Self {
        let media = MediaStore::new(settings.media_root.clone(), settings.media_url.clone());
        Self {
            pool: Arc::new(pool),
            settings: Arc::new(settings),
            media: Arc::new(media),
        }
    }
}

/// The complete HTTP surface: `/api`, uploaded media and the API docs.
pub fn build_router(state: AppState) -> Router {
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());
    let media_files = ServeDir::new(state.media.root());
    let media_prefix = state.settings.media_url.trim_end_matches('/').to_string();

    let router = Router::new()
        .nest("/api", api::router())
        .merge(swagger_ui);
    let router = if media_prefix.is_empty() {
        router.fallback_service(media_files)
    } else {
        router.nest_service(&media_prefix, media_files)
    };

    let router = router.layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    router.with_state(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(request.uri().path());

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %matched_path,
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::http::Response<_>, latency: Duration, _span: &Span| {
                    let status = response.status().as_u16();
                    if status >= 500 {
                        tracing::error!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request failed with server error"
                        );
                    } else {
                        tracing::info!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request completed"
                        );
                    }
                },
            )
            .on_failure(
                |error: tower_http::classify::ServerErrorsFailureClass,
                 latency: Duration,
                 _span: &Span| {
                    tracing::error!(
                        error = %error,
                        latency_ms = %latency.as_millis(),
                        "request failed"
                    );
                },
            ),
    )
}
