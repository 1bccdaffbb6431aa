//! Transcode pipeline collaborator
//!
//! The control server never encodes or packages anything itself. It hands an
//! accepted job to a `Pipeline` and asks it to stop again:
//! - `ProcessPipeline` runs an external command per job
//! - `RecordingPipeline` only records jobs (dry run and tests)

pub mod process;
pub mod recording;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use streamer_config::NormalizedConfig;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::PipelineError;

pub use process::ProcessPipeline;
pub use recording::RecordingPipeline;

/// An accepted job, owned by the pipeline once started
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub config: NormalizedConfig,
}

impl Job {
    pub fn new(config: NormalizedConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            config,
        }
    }
}

/// State of the most recent job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineStatus {
    /// No job has been started
    Idle,
    Running,
    /// Stopped on request
    Stopped,
    /// Exited on its own with success
    Finished,
    /// Exited on its own with an error; no exit code when killed by a signal
    Failed { exit_code: Option<i32> },
}

impl PipelineStatus {
    pub fn is_running(self) -> bool {
        self == PipelineStatus::Running
    }
}

/// The transcode/package pipeline behind the control server.
///
/// Calls may block; the HTTP layer runs them on the blocking thread pool.
pub trait Pipeline: Send + Sync {
    /// Start `job`, replacing any job that is still running.
    fn start(&self, job: &Job) -> Result<(), PipelineError>;

    /// Stop the running job. Returns whether there was one. Stopping an idle
    /// pipeline is not an error.
    fn stop(&self) -> Result<bool, PipelineError>;

    fn status(&self) -> PipelineStatus;
}

/// Build the pipeline described by the server configuration
pub fn from_config(config: &ServerConfig) -> Arc<dyn Pipeline> {
    match &config.pipeline.command {
        Some(command) => {
            tracing::info!("Jobs run with {:?}", command);
            Arc::new(ProcessPipeline::new(
                command.clone(),
                config.pipeline.args.clone(),
                config.output_dir.clone(),
            ))
        }
        None => {
            tracing::warn!("No pipeline command configured, jobs are recorded but not run");
            Arc::new(RecordingPipeline::new())
        }
    }
}
