//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One websocket endpoint at the configured canvas path plus a health check,
//! with permissive CORS and request tracing on everything.

pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::HEALTH_PATH;
use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let canvas_path = state.config.canvas_path.clone();

    Router::new()
        .route(&canvas_path, get(ws::handle_ws))
        .route(HEALTH_PATH, get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
