//! Configuration management for otlp-series.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable and CLI overrides (applied by the CLI)
//! - Validation and defaults

use crate::core::{Result, SeriesError, ServiceName};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete configuration for otlp-series
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output configuration
    pub output: OutputConfig,
    /// Processing configuration
    pub processing: ProcessingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode: debug-level logging and a per-problem report
    #[serde(skip)]
    pub debug: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the CSV series are written to
    pub results_dir: PathBuf,
}

/// Processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Record counter data points without a value as diagnostics
    pub strict: bool,
    /// Service name used when a resource carries no `service.name`
    pub fallback_service_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Structured logging format
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything, including per-file tracing
    Trace,
    /// Decoding and file creation details
    Debug,
    /// Per-file summaries
    Info,
    /// Diagnostics only
    Warn,
    /// Failures only
    Error,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            results_dir: PathBuf::from("results"),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ProcessingConfig {
            strict: false,
            fallback_service_name: "unknown".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            structured: false,
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.output.results_dir.as_os_str().is_empty() {
            return Err(SeriesError::config("results_dir must not be empty"));
        }

        let fallback = &self.processing.fallback_service_name;
        if fallback.is_empty() {
            return Err(SeriesError::config("fallback_service_name must not be empty"));
        }
        if fallback.contains(['/', '\\']) {
            return Err(SeriesError::config(format!(
                "fallback_service_name must not contain path separators, got '{}'",
                fallback
            )));
        }
        ServiceName::new(fallback.clone())
            .map_err(|e| SeriesError::config(format!("fallback_service_name: {}", e)))?;

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| SeriesError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set results directory
    pub fn results_dir(mut self, path: PathBuf) -> Self {
        self.config.output.results_dir = path;
        self
    }

    /// Enable strict value validation
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.processing.strict = strict;
        self
    }

    /// Set the fallback service name
    pub fn fallback_service_name(mut self, name: &str) -> Self {
        self.config.processing.fallback_service_name = name.to_string();
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
