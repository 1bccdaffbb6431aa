//! Dry-run pipeline that accepts jobs without running them

use parking_lot::Mutex;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{Job, Pipeline, PipelineStatus};
use crate::error::PipelineError;

/// Tracks only the state of the latest job. Test builds also keep every
/// started job and can be told to refuse starts.
#[derive(Debug, Default)]
pub struct RecordingPipeline {
    status: Mutex<Option<PipelineStatus>>,
    #[cfg(test)]
    history: Mutex<Vec<Job>>,
    #[cfg(test)]
    stop_calls: AtomicUsize,
    #[cfg(test)]
    fail_start: AtomicBool,
}

impl RecordingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline whose `start` always fails, for exercising fault paths
    #[cfg(test)]
    pub fn failing() -> Self {
        let pipeline = Self::default();
        pipeline.set_fail_start(true);
        pipeline
    }

    #[cfg(test)]
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Every job started so far, oldest first
    #[cfg(test)]
    pub fn jobs(&self) -> Vec<Job> {
        self.history.lock().clone()
    }

    #[cfg(test)]
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl Pipeline for RecordingPipeline {
    fn start(&self, job: &Job) -> Result<(), PipelineError> {
        #[cfg(test)]
        {
            if self.fail_start.load(Ordering::SeqCst) {
                return Err(PipelineError::Spawn {
                    command: "recording".to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "start refused"),
                });
            }
            self.history.lock().push(job.clone());
        }

        tracing::info!(
            job_id = %job.id,
            inputs = job.config.input_count(),
            "Dry run: job accepted"
        );
        tracing::debug!(job_id = %job.id, config = ?job.config, "Dry run job configuration");
        *self.status.lock() = Some(PipelineStatus::Running);
        Ok(())
    }

    fn stop(&self) -> Result<bool, PipelineError> {
        #[cfg(test)]
        self.stop_calls.fetch_add(1, Ordering::SeqCst);

        let mut status = self.status.lock();
        let was_running = status.is_some_and(PipelineStatus::is_running);
        if was_running {
            *status = Some(PipelineStatus::Stopped);
        }
        Ok(was_running)
    }

    fn status(&self) -> PipelineStatus {
        self.status.lock().unwrap_or(PipelineStatus::Idle)
    }
}
