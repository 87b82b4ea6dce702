//! Route configuration for the log API.

use std::sync::Arc;

use axum::routing::{Router, get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers::{health_check, query_logs, stream_logs, submit_log};
use crate::state::AppState;
use crate::websocket::ws_upgrade;

/// Create the log API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(state.config());

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/logs", get(query_logs).post(submit_log))
        .route("/logs/stream", get(stream_logs))
        .route("/ws", get(ws_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}
