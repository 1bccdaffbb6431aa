//! Pipeline that runs each job as an external process
//!
//! The job is written to `<output_dir>/job.json` and the configured command
//! is invoked as `<command> <args...> <job.json> <output_dir>`.

use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};

use super::{Job, Pipeline, PipelineStatus};
use crate::error::PipelineError;

/// File name of the serialized job inside the output directory
pub const JOB_FILE: &str = "job.json";

pub struct ProcessPipeline {
    command: String,
    args: Vec<String>,
    output_dir: PathBuf,
    child: Mutex<Option<Child>>,
    last_status: Mutex<PipelineStatus>,
}

impl ProcessPipeline {
    pub fn new(command: String, args: Vec<String>, output_dir: PathBuf) -> Self {
        Self {
            command,
            args,
            output_dir,
            child: Mutex::new(None),
            last_status: Mutex::new(PipelineStatus::Idle),
        }
    }

    fn write_job(&self, job: &Job) -> Result<PathBuf, PipelineError> {
        let prepare_err = |source| PipelineError::Prepare {
            path: self.output_dir.display().to_string(),
            source,
        };

        std::fs::create_dir_all(&self.output_dir).map_err(prepare_err)?;
        let job_path = self.output_dir.join(JOB_FILE);
        let content = serde_json::to_vec_pretty(job)?;
        std::fs::write(&job_path, content).map_err(prepare_err)?;
        Ok(job_path)
    }
}

fn exit_status(status: ExitStatus) -> PipelineStatus {
    if status.success() {
        PipelineStatus::Finished
    } else {
        PipelineStatus::Failed {
            exit_code: status.code(),
        }
    }
}

impl Pipeline for ProcessPipeline {
    fn start(&self, job: &Job) -> Result<(), PipelineError> {
        self.stop()?;

        let job_path = self.write_job(job)?;
        let child = Command::new(&self.command)
            .args(&self.args)
            .arg(&job_path)
            .arg(&self.output_dir)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| PipelineError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        tracing::info!(job_id = %job.id, pid = child.id(), "Pipeline process started");
        *self.child.lock() = Some(child);
        *self.last_status.lock() = PipelineStatus::Running;
        Ok(())
    }

    fn stop(&self) -> Result<bool, PipelineError> {
        let Some(mut child) = self.child.lock().take() else {
            return Ok(false);
        };

        match child.try_wait().map_err(PipelineError::Stop)? {
            Some(status) => {
                // Exited before we got to it.
                *self.last_status.lock() = exit_status(status);
            }
            None => {
                match child.kill() {
                    Ok(()) => {}
                    // Already reaped between try_wait and kill.
                    Err(e) if e.kind() == ErrorKind::InvalidInput => {}
                    Err(e) => return Err(PipelineError::Stop(e)),
                }
                child.wait().map_err(PipelineError::Stop)?;
                *self.last_status.lock() = PipelineStatus::Stopped;
                tracing::info!(pid = child.id(), "Pipeline process stopped");
            }
        }
        Ok(true)
    }

    fn status(&self) -> PipelineStatus {
        let mut guard = self.child.lock();
        if let Some(child) = guard.as_mut() {
            match child.try_wait() {
                Ok(None) => return PipelineStatus::Running,
                Ok(Some(status)) => {
                    let status = exit_status(status);
                    tracing::info!(pid = child.id(), ?status, "Pipeline process exited");
                    *self.last_status.lock() = status;
                    *guard = None;
                }
                Err(e) => {
                    tracing::warn!("Failed to poll pipeline process: {}", e);
                    return PipelineStatus::Running;
                }
            }
        }
        *self.last_status.lock()
    }
}

impl Drop for ProcessPipeline {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("{}", e);
        }
    }
}
