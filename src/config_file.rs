//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{LogFormat, PipelineRunnerConfig, ServerConfig};
use crate::error::{Result, ServerError};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Pipeline settings
    pub pipeline: Option<PipelineSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Limits settings
    pub limits: Option<LimitsSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
    /// Pipeline output directory
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// External command that runs a job
    pub command: Option<String>,
    /// Leading arguments for the command
    pub args: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<LogFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Maximum request body size in KB
    pub max_request_size_kb: Option<usize>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let defaults = ServerConfig::default();
        Self {
            server: ServerSettings {
                host: defaults.host,
                port: defaults.port,
                cors_enabled: Some(defaults.cors_enabled),
                output_dir: Some(defaults.output_dir),
            },
            pipeline: Some(PipelineSettings {
                command: None,
                args: Some(Vec::new()),
            }),
            logging: Some(LoggingSettings {
                level: defaults.log_level,
                format: Some(defaults.log_format),
            }),
            limits: Some(LimitsSettings {
                max_request_size_kb: Some(defaults.max_request_size_kb),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        let pipeline = self.pipeline.map(|p| PipelineRunnerConfig {
            command: p.command,
            args: p.args.unwrap_or_default(),
        });

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            output_dir: self.server.output_dir.unwrap_or(defaults.output_dir),
            pipeline: pipeline.unwrap_or(defaults.pipeline),
            cors_enabled: self.server.cors_enabled.unwrap_or(defaults.cors_enabled),
            log_level: self
                .logging
                .as_ref()
                .map(|l| l.level.clone())
                .unwrap_or(defaults.log_level),
            log_format: self
                .logging
                .and_then(|l| l.format)
                .unwrap_or(defaults.log_format),
            max_request_size_kb: self
                .limits
                .and_then(|l| l.max_request_size_kb)
                .unwrap_or(defaults.max_request_size_kb),
        }
    }
}

/// Load the server configuration from `path`.
///
/// A missing file is not an error and yields the defaults.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ServerConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(ServerConfig::default());
    }
    ConfigFile::from_file(path).map(ConfigFile::into_server_config)
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    ConfigFile::default_config().to_file(path)
}
