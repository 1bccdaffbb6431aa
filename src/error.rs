//! Server-specific error types

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use streamer_config::ValidationError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors raised by the pipeline collaborator
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to prepare job directory {path}: {source}")]
    Prepare {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize job: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to spawn pipeline command {command:?}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Failed to stop pipeline: {0}")]
    Stop(std::io::Error),
}

#[derive(Debug, Error)]
pub enum ServerError {
    /// A user-fixable configuration problem
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// The body could not be read as JSON
    #[error("Bad request: {0}")]
    Rejected(#[from] JsonRejection),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::Validation(e) => e.error_type.as_str(),
            ServerError::Pipeline(_) => "pipeline",
            ServerError::Rejected(_) => "rejected",
            ServerError::Config(_) => "config",
            ServerError::Internal(_) => "internal",
            ServerError::Io(_) => "io",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            // Structured config errors get their own status so clients can tell
            // them apart from faults.
            ServerError::Validation(e) => (StatusCode::IM_A_TEAPOT, Json(e)).into_response(),
            ServerError::Rejected(rejection) => rejection.into_response(),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response(),
        }
    }
}
