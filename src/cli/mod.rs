//! Command-line interface for otlp-series.
//!
//! Point it at one or more OTLP metric payload files and it appends the
//! extracted series to the results directory.

use crate::application::{Application, ProcessReport};
use crate::core::{Config, Result, SeriesError};
use crate::receiver::PayloadFormat;
use clap::Parser;
use std::path::PathBuf;

/// Convert OTLP span-metric payloads into per-service CSV time series
#[derive(Parser, Debug)]
#[command(name = "otlp-series")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Payload files to process
    #[arg(required_unless_present = "check_config")]
    pub inputs: Vec<PathBuf>,

    /// Directory the CSV series are written to
    #[arg(short = 'o', long, env = "OTLP_SERIES_RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,

    /// Payload encoding: auto, json or protobuf
    #[arg(short, long, env = "OTLP_SERIES_FORMAT", default_value = "auto")]
    pub format: PayloadFormat,

    /// Configuration file path (default: <config dir>/otlp-series/config.yaml)
    #[arg(short, long, env = "OTLP_SERIES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Report counter data points without a value
    #[arg(long, env = "OTLP_SERIES_STRICT")]
    pub strict: bool,

    /// Enable debug logging
    #[arg(short, long, env = "OTLP_SERIES_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments and environment variables (highest priority)
    /// 2. Config file
    /// 3. Defaults (lowest priority)
    pub fn load_config(&self) -> Result<Config> {
        use crate::core::config::ConfigBuilder;

        let mut builder = ConfigBuilder::new();

        let config_path = if let Some(path) = &self.config {
            Some(path.clone())
        } else {
            dirs::config_dir()
                .map(|d| d.join("otlp-series").join("config.yaml"))
                .filter(|p| p.exists())
        };

        if let Some(config_path) = config_path {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => {
                    builder = builder.from_yaml(&content)?;
                    tracing::info!("Loaded configuration from: {:?}", config_path);
                },
                Err(e) if self.config.is_some() => {
                    return Err(SeriesError::config(format!(
                        "Failed to read config file {:?}: {}",
                        config_path, e
                    )));
                },
                Err(_) => {
                    tracing::debug!("No config file found at {:?}, using defaults", config_path);
                },
            }
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: crate::core::config::ConfigBuilder) -> Result<Config> {
        if let Some(dir) = &self.results_dir {
            builder = builder.results_dir(dir.clone());
        }
        if self.strict {
            builder = builder.strict(true);
        }

        builder.debug(self.debug).build()
    }

    /// Initialize logging from the loaded configuration.
    ///
    /// Debug mode wins over `RUST_LOG`, which wins over `OTLP_SERIES_LOG_LEVEL`,
    /// which wins over the configured level.
    pub fn init_logging(config: &Config) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let logging = &config.logging;
        let filter = if config.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = std::env::var("OTLP_SERIES_LOG_LEVEL")
                    .unwrap_or_else(|_| logging.level.as_str().to_string());
                EnvFilter::new(level)
            })
        };

        let fmt_layer = if logging.structured {
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .compact()
        } else {
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact()
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| SeriesError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute the CLI.
pub fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    Cli::init_logging(&config)?;

    if cli.check_config {
        config.validate()?;
        println!("Configuration is valid!");
        println!("  Results dir: {}", config.output.results_dir.display());
        println!("  Strict: {}", config.processing.strict);
        println!("  Fallback service: {}", config.processing.fallback_service_name);
        return Ok(());
    }

    let app = Application::new(config)?;
    let mut report = ProcessReport::default();
    for input in &cli.inputs {
        report.merge(app.process_file(input, cli.format)?);
    }

    println!(
        "{} files in, {} rows written to {} series under {}",
        cli.inputs.len(),
        report.rows_written,
        report.files.len(),
        app.writer().root().display()
    );
    if !report.diagnostics.is_empty() {
        println!("{} problems skipped:", report.diagnostics.len());
        for (category, count) in report.diagnostics.by_category() {
            println!("  {}: {}", category, count);
        }
    }
    if app.config().debug {
        for diagnostic in report.diagnostics.iter() {
            println!("  [{}] {}", diagnostic.metric, diagnostic.error);
        }
    }

    Ok(())
}
