pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod loader;
pub mod models;
pub mod raw_sql;
pub mod schema;
pub mod telemetry;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRef};
use axum::Router;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::db::DbPool;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        Self {
            pool: Arc::new(pool),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Arc<DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// Build the full HTTP application.
///
/// API routes ignore a trailing slash. Swagger UI sits outside the
/// normalization because it redirects `/swagger-ui` to `/swagger-ui/`.
pub fn app(state: AppState) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    let api_router = Router::new()
        .nest("/api/auth/token", api::auth::router())
        .nest("/api/users", api::users::router())
        .nest("/api/tags", api::tags::router())
        .nest("/api/ingredients", api::ingredients::router())
        .nest("/api/recipes", api::recipes::router())
        .nest("/media", api::media::router())
        .fallback(api::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(telemetry::make_span)
                .on_request(())
                .on_response(telemetry::on_response)
                .on_failure(telemetry::on_failure),
        );

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    Router::new()
        .merge(swagger_ui)
        .fallback_service(NormalizePathLayer::trim_trailing_slash().layer(api_router))
}
