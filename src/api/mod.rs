pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{control::ControlService, reading_cache::ReadingCache};
use handlers::ApiDoc;

/// Everything the handlers share. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub cache: ReadingCache,
    pub control: ControlService,
    pub energy_cost_rate: f64,
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/api/data", get(handlers::get_current_reading))
        .route("/api/control", post(handlers::set_relay))
        .route("/api/history", get(handlers::get_history))
        .route("/api/analytics", get(handlers::get_analytics))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .layer(CorsLayer::permissive())
}
