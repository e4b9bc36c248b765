//! Typed attribute extraction from OTLP attribute lists.

use crate::core::{Result, SeriesError};
use opentelemetry_proto::tonic::common::v1::{any_value::Value, KeyValue};
use std::collections::HashMap;

/// Semantic field holding the span kind
pub const REQUEST_TYPE: &str = "requestType";
/// Semantic field holding the status code
pub const STATUS: &str = "status";

/// Source key to semantic field mapping used by the request recognizers
pub const SPAN_ATTRIBUTES: &[(&str, &str)] = &[("span.kind", REQUEST_TYPE), ("status.code", STATUS)];

/// Attributes retained by [`extract_attributes`], keyed by semantic field name
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractedAttributes<'t> {
    fields: HashMap<&'t str, String>,
}

impl<'t> ExtractedAttributes<'t> {
    /// Look up a field
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Look up a field that downstream logic cannot do without
    pub fn require(&self, field: &str) -> Result<&str> {
        self.get(field)
            .ok_or_else(|| SeriesError::missing_attribute(field))
    }
}

/// Pull the string-typed attributes named in `targets` out of `attributes`.
///
/// Keys outside `targets` and non-string values are skipped. When a key
/// repeats, the last string-typed occurrence wins.
pub fn extract_attributes<'t>(
    attributes: &[KeyValue],
    targets: &[(&str, &'t str)],
) -> ExtractedAttributes<'t> {
    let mut fields = HashMap::with_capacity(targets.len());
    for attr in attributes {
        let Some(&(_, field)) = targets.iter().find(|(source, _)| *source == attr.key) else {
            continue;
        };
        if let Some(Value::StringValue(s)) = attr.value.as_ref().and_then(|v| v.value.as_ref()) {
            fields.insert(field, s.clone());
        }
    }
    ExtractedAttributes { fields }
}
