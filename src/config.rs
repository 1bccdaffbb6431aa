//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the transcode pipeline is launched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineRunnerConfig {
    /// External command that runs a job. When unset, jobs are only recorded
    /// (dry run).
    pub command: Option<String>,

    /// Arguments placed before the job file and output directory
    pub args: Vec<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Directory the pipeline writes manifests and segments into; served
    /// under `/output`
    pub output_dir: PathBuf,

    /// Pipeline launch settings
    pub pipeline: PipelineRunnerConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Maximum accepted request body in kilobytes
    pub max_request_size_kb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            output_dir: PathBuf::from("output_files"),
            pipeline: PipelineRunnerConfig::default(),
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            max_request_size_kb: 1024,
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the request body limit in bytes
    pub fn max_request_size_bytes(&self) -> usize {
        self.max_request_size_kb * 1024
    }

    /// Whether jobs are launched as a real process
    pub fn is_dry_run(&self) -> bool {
        self.pipeline.command.is_none()
    }
}
