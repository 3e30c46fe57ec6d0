pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::layout::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Layout analysis
        .route("/api/v1/layout/calculate", post(handlers::handle_calculate))
        .route("/api/v1/layout/overflow", post(handlers::handle_overflow))
        .route(
            "/api/v1/layout/overflow/details",
            post(handlers::handle_overflow_details),
        )
        .route(
            "/api/v1/layout/overflow/prioritized",
            post(handlers::handle_prioritized_overflow),
        )
        .route("/api/v1/layout/warnings", post(handlers::handle_warnings))
        .route("/api/v1/layout/optimize", post(handlers::handle_optimize))
        // Configuration
        .route("/api/v1/layout/css", post(handlers::handle_css))
        .route(
            "/api/v1/layout/validate-config",
            post(handlers::handle_validate_config),
        )
        .with_state(state)
}
