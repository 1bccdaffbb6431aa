//! Job control handlers
//!
//! Handles starting, stopping and inspecting the pipeline job.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::pipeline::{Job, PipelineStatus};
use crate::state::AppState;

/// Response after starting a job
#[derive(Debug, Serialize)]
pub struct StartJobResponse {
    pub job_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Number of periods
    pub periods: usize,
    /// Number of inputs across all periods
    pub inputs: usize,
}

#[derive(Debug, Serialize)]
pub struct StopJobResponse {
    /// Whether a running job was stopped
    pub stopped: bool,
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    #[serde(flatten)]
    pub status: PipelineStatus,
    pub job_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Validate a job configuration and hand it to the pipeline
/// POST /start
pub async fn start_job(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<StartJobResponse>> {
    start(&state, payload).await.map_err(|e| record(&state, e))
}

async fn start(
    state: &AppState,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<StartJobResponse>> {
    let Json(body) = payload?;

    // Nothing reaches the pipeline unless the whole request is valid.
    let config = streamer_config::validate_request(&body)?;
    let job = Job::new(config);

    let _guard = state.job_lock.lock().await;

    let pipeline = Arc::clone(&state.pipeline);
    let pipeline_job = job.clone();
    let (replaced, started) = tokio::task::spawn_blocking(move || {
        let replaced = pipeline.stop()?;
        Ok::<_, ServerError>((replaced, pipeline.start(&pipeline_job)))
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Task failed: {}", e)))??;

    // The previous job is gone even when the new one fails to start.
    if replaced {
        state.metrics.record_job_stopped();
    }
    started?;
    state.metrics.record_job_started();

    let response = StartJobResponse {
        job_id: job.id,
        started_at: job.started_at,
        periods: job.config.periods.len(),
        inputs: job.config.input_count(),
    };
    tracing::info!(
        job_id = %job.id,
        periods = response.periods,
        inputs = response.inputs,
        live = job.config.is_live(),
        replaced,
        "Job started"
    );
    state.set_current_job(job);

    Ok(Json(response))
}

/// Stop the running job, if any
/// POST /stop
pub async fn stop_job(State(state): State<Arc<AppState>>) -> Result<Json<StopJobResponse>> {
    stop(&state).await.map_err(|e| record(&state, e))
}

async fn stop(state: &AppState) -> Result<Json<StopJobResponse>> {
    let _guard = state.job_lock.lock().await;

    let pipeline = Arc::clone(&state.pipeline);
    let stopped = tokio::task::spawn_blocking(move || pipeline.stop())
        .await
        .map_err(|e| ServerError::Internal(format!("Task failed: {}", e)))??;

    if stopped {
        state.metrics.record_job_stopped();
        tracing::info!("Job stopped");
    } else {
        tracing::debug!("Stop requested with no job running");
    }

    Ok(Json(StopJobResponse { stopped }))
}

/// State of the most recent job
/// GET /status
pub async fn job_status(State(state): State<Arc<AppState>>) -> Json<JobStatusResponse> {
    let job = state.current_job();
    Json(JobStatusResponse {
        status: state.pipeline.status(),
        job_id: job.as_ref().map(|j| j.id),
        started_at: job.as_ref().map(|j| j.started_at),
    })
}

fn record(state: &AppState, err: ServerError) -> ServerError {
    match &err {
        ServerError::Validation(e) => {
            tracing::warn!(location = %e.location, "Rejected job configuration: {}", e);
            state.metrics.record_validation_error(e.error_type.as_str());
        }
        ServerError::Rejected(rejection) => {
            tracing::warn!("Rejected request body: {}", rejection.body_text());
            state.metrics.record_error(err.kind());
        }
        other => {
            tracing::error!("{}", other);
            state.metrics.record_error(other.kind());
        }
    }
    err
}
