//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - The pipeline collaborator and the job it is running
//! - Request metrics
//! - Server configuration

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::metrics::Metrics;
use crate::pipeline::{self, Job, Pipeline};

/// Application state shared across all handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Where accepted jobs go
    pub pipeline: Arc<dyn Pipeline>,

    /// Most recently started job
    pub current_job: RwLock<Option<Job>>,

    /// Serializes start and stop so a new job never overlaps teardown of
    /// the old one
    pub job_lock: tokio::sync::Mutex<()>,

    pub metrics: Metrics,
}

impl AppState {
    /// Create a new AppState with the pipeline described by `config`
    pub fn new(config: ServerConfig) -> Self {
        let pipeline = pipeline::from_config(&config);
        Self::with_pipeline(config, pipeline)
    }

    pub fn with_pipeline(config: ServerConfig, pipeline: Arc<dyn Pipeline>) -> Self {
        Self {
            config,
            pipeline,
            current_job: RwLock::new(None),
            job_lock: tokio::sync::Mutex::new(()),
            metrics: Metrics::new(),
        }
    }

    /// Remember the job that was just handed to the pipeline
    pub fn set_current_job(&self, job: Job) {
        *self.current_job.write() = Some(job);
    }

    pub fn current_job(&self) -> Option<Job> {
        self.current_job.read().clone()
    }
}
