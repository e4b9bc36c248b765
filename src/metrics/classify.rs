//! Span kind to request category mapping.

use crate::core::{Result, SeriesError};

/// Substring of `status.code` that marks a failed request
pub const ERROR_MARKER: &str = "ERR";

/// Normalized request direction/synchrony label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// `SPAN_KIND_INTERNAL`
    Internal,
    /// `SPAN_KIND_CLIENT`
    Incoming,
    /// `SPAN_KIND_SERVER`
    Outgoing,
    /// `SPAN_KIND_CONSUMER`
    IncomingAsync,
    /// `SPAN_KIND_PRODUCER`
    OutgoingAsync,
    /// Span kind was not recognized
    Unknown,
}

impl Category {
    /// Categories reachable from a known span kind
    pub const KNOWN: [Category; 5] = [
        Category::Internal,
        Category::Incoming,
        Category::Outgoing,
        Category::IncomingAsync,
        Category::OutgoingAsync,
    ];

    /// Label used in file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Internal => "internal",
            Category::Incoming => "incoming",
            Category::Outgoing => "outgoing",
            Category::IncomingAsync => "incomingAsync",
            Category::OutgoingAsync => "outgoingAsync",
            Category::Unknown => "unknown",
        }
    }

    /// Whether records of this category carry an error flag
    pub fn tracks_errors(&self) -> bool {
        !matches!(self, Category::Internal)
    }
}

/// Map a span kind code to its category.
///
/// Accepts both the OTLP form (`SPAN_KIND_SERVER`) and the bare name (`SERVER`).
pub fn classify_span_kind(kind: &str) -> Result<Category> {
    let code = kind.strip_prefix("SPAN_KIND_").unwrap_or(kind);
    match code {
        "INTERNAL" => Ok(Category::Internal),
        "CLIENT" => Ok(Category::Incoming),
        "SERVER" => Ok(Category::Outgoing),
        "CONSUMER" => Ok(Category::IncomingAsync),
        "PRODUCER" => Ok(Category::OutgoingAsync),
        _ => Err(SeriesError::UnknownSpanKind(kind.to_string())),
    }
}

/// True when the status code text contains the error marker
pub fn is_error_status(status: &str) -> bool {
    status.contains(ERROR_MARKER)
}
