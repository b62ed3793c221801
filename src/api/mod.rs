pub mod dto;
pub mod errors;
pub mod handlers;
pub mod params;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{control::CommandPublisher, db::ReadingStore};

use handlers::ApiDoc;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: ReadingStore,
    pub commands: CommandPublisher,
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/sensors", get(handlers::list_sensors))
        .route(
            "/sensors/{id}",
            get(handlers::get_latest_reading).post(handlers::send_command),
        )
        .route("/sensors/{id}/readings", get(handlers::get_readings))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
