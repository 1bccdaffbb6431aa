//! Axum router configuration

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::state::AppState;

use super::handlers::{health_check, version_check};
use super::jobs::{job_status, start_job, stop_job};
use super::middleware::request_logger;

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let output = ServeDir::new(&state.config.output_dir);

    let router = Router::new()
        // Job control
        .route("/start", post(start_job))
        .route("/stop", post(stop_job))
        .route("/status", get(job_status))
        // Health, version and metrics endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        .route("/metrics", get(metrics_handler))
        // Manifests and segments written by the pipeline
        .nest_service("/output", output)
        // Middleware
        .layer(DefaultBodyLimit::max(state.config.max_request_size_bytes()))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            request_logger,
        ))
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    };

    router.with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS, Method::HEAD])
        .allow_headers([
            header::ACCEPT,
            header::RANGE,
            header::CONTENT_TYPE,
            header::ORIGIN,
        ])
        .max_age(Duration::from_secs(3600))
}
