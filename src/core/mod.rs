//! Core domain types, configuration and error handling.
//!
//! This module contains the fundamental types shared by the extraction
//! engine, the payload decoders and the CSV writer.

#![warn(missing_docs)]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, LogLevel};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{Result, SeriesError};
pub use types::{ServiceMetadata, ServiceName};
