use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::state::AppState;

/// Health check endpoint
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Version information endpoint
pub async fn version_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "version": env!("CARGO_PKG_VERSION"),
        "dry_run": state.config.is_dry_run(),
    }))
}
