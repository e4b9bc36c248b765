//! OTLP metrics payload decoding.
//!
//! Payloads arrive as OTLP/JSON (collector file exporter output) or as
//! binary OTLP/protobuf `ExportMetricsServiceRequest` messages. Both are
//! decoded into the `opentelemetry-proto` types the extraction engine reads.

pub mod json;

use crate::core::{Result, SeriesError, ServiceMetadata};
use opentelemetry_proto::tonic::{
    collector::metrics::v1::ExportMetricsServiceRequest,
    common::v1::{any_value::Value, KeyValue},
    resource::v1::Resource,
};
use prost::Message;
use std::path::Path;

pub use json::parse_json_requests;

/// Encoding of a payload file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Pick by file extension
    Auto,
    /// OTLP/JSON, one request or newline-delimited requests
    Json,
    /// Binary OTLP/protobuf, one request per file
    Protobuf,
}

impl std::str::FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(PayloadFormat::Auto),
            "json" => Ok(PayloadFormat::Json),
            "protobuf" | "proto" | "pb" => Ok(PayloadFormat::Protobuf),
            _ => Err(format!("Unknown payload format: {}", s)),
        }
    }
}

impl PayloadFormat {
    /// Resolve `Auto` against a file path
    pub fn resolve(self, path: &Path) -> PayloadFormat {
        match self {
            PayloadFormat::Auto => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_ascii_lowercase);
                match ext.as_deref() {
                    Some("pb" | "binpb" | "protobuf") => PayloadFormat::Protobuf,
                    _ => PayloadFormat::Json,
                }
            },
            other => other,
        }
    }
}

/// Decode a payload held in memory
pub fn decode_payload(bytes: &[u8], format: PayloadFormat) -> Result<Vec<ExportMetricsServiceRequest>> {
    match format {
        PayloadFormat::Protobuf => Ok(vec![ExportMetricsServiceRequest::decode(bytes)?]),
        PayloadFormat::Json | PayloadFormat::Auto => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| SeriesError::malformed(format!("payload is not UTF-8: {}", e)))?;
            parse_json_requests(text)
        },
    }
}

/// Read and decode a payload file
pub fn read_requests(path: &Path, format: PayloadFormat) -> Result<Vec<ExportMetricsServiceRequest>> {
    let bytes = std::fs::read(path)?;
    let format = format.resolve(path);
    tracing::debug!("Decoding {:?} as {:?} ({} bytes)", path, format, bytes.len());
    decode_payload(&bytes, format)
}

/// Extract a string resource attribute by key
pub fn extract_resource_attribute<'a>(attributes: &'a [KeyValue], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .filter(|attr| attr.key == key)
        .filter_map(|attr| match attr.value.as_ref()?.value.as_ref()? {
            Value::StringValue(s) => Some(s.as_str()),
            _ => None,
        })
        .last()
}

/// Service metadata for a resource, falling back to `fallback` when
/// `service.name` is absent or empty
pub fn service_metadata(resource: Option<&Resource>, fallback: &str) -> Result<ServiceMetadata> {
    let name = resource
        .and_then(|r| extract_resource_attribute(&r.attributes, "service.name"))
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback);
    ServiceMetadata::new(name)
}
