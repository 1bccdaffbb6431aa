//! HTTP middleware

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::state::AppState;

/// Request logging middleware
///
/// Counts every request under its route pattern, so paths below `/output`
/// do not each get their own metrics series.
pub async fn request_logger(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();
    state.metrics.record_request(&endpoint);

    if status.is_success() {
        info!("{} {} {} in {:?}", method, uri, status, duration);
    } else {
        warn!("{} {} {} in {:?}", method, uri, status, duration);
    }

    response
}
