//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the control endpoints
//! - Job start/stop/status handlers
//! - Health, version and metrics endpoints
//! - Static serving of pipeline output
//! - Request logging and CORS middleware

pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
