//! Route definitions and router construction.

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// API routes without the `/api/v1` prefix; the caller nests and
/// applies state.
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/hawking/tasks",
            get(handlers::hawking::get_tasks).post(handlers::hawking::add_task),
        )
        .route("/hawking/tasks/{id}", delete(handlers::hawking::remove_task))
        .route("/hawking/voice", post(handlers::hawking::change_voice))
        .route("/hawking/intros", get(handlers::hawking::intro_pool))
        .route("/products/sync", post(handlers::products::sync))
        .route("/ws", get(handlers::ws::upgrade))
}

/// Create the main router: API under `/api/v1`, the static audio tree
/// under `/static`, and a health probe.
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let static_dir = ctx.settings.server.static_dir.clone();
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(health_check))
        .nest_service("/static", ServeDir::new(static_dir))
        .nest("/api/v1", api_routes().with_state(state).layer(cors))
}

/// Health check endpoint.
pub(crate) async fn health_check() -> &'static str {
    "OK"
}
