//! Metric extraction and classification engine.
//!
//! Raw OTLP metrics flow through here in four steps:
//! - [`recognizer::MetricKind::detect`] picks a recognizer by metric name
//! - [`decode`] turns data points into `{time, value}` records
//! - [`attributes`] and [`classify`] enrich each record with its category
//! - [`recognizer::RecognizedMetric::write`] groups records per file and hands them to the writer

pub mod attributes;
pub mod classify;
pub mod decode;
pub mod recognizer;
pub mod types;

pub use attributes::{extract_attributes, ExtractedAttributes};
pub use classify::{classify_span_kind, is_error_status, Category};
pub use decode::DecodeOptions;
pub use recognizer::{MetricKind, RecognizedMetric, WriteSummary};
pub use types::{ErrorBucket, FileKey, NormalizedRecord, PartialRecord, SampleValue, SeriesKind};
