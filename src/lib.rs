//! otlp-series - OTLP span metrics to CSV time series.
//!
//! Turns OpenTelemetry metric export payloads (typically the `calls` and
//! `duration` metrics emitted by a span-metrics connector) into flat,
//! per-service CSV files suitable for offline analysis.
//!
//! # Architecture
//!
//! - `receiver`: OTLP/JSON and OTLP/protobuf payload decoding
//! - `metrics`: attribute extraction, data point decoding, span kind
//!   classification and the `calls`/`duration` recognizers
//! - `export`: append-only CSV series writer
//! - `core`: configuration, errors and shared types
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use otlp_series::core::Config;
//! use otlp_series::receiver::PayloadFormat;
//! use otlp_series::Application;
//! use std::path::Path;
//!
//! fn main() -> otlp_series::Result<()> {
//!     let app = Application::new(Config::default())?;
//!     let report = app.process_file(Path::new("metrics.json"), PayloadFormat::Auto)?;
//!     println!("{} rows written", report.rows_written);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod application;
pub mod cli;
pub mod core;
pub mod export;
pub mod metrics;
pub mod receiver;

// Re-export core types for convenience
pub use crate::application::{Application, ProcessReport};
pub use crate::core::{Config, Result};
