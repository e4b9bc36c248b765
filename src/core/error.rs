//! Error types for otlp-series.

use thiserror::Error;

/// Everything that can go wrong while turning payloads into series
#[derive(Error, Debug)]
pub enum SeriesError {
    /// A data point lacks an attribute its recognizer requires
    #[error("Missing attribute: {field}")]
    MissingAttribute {
        /// Semantic field name, e.g. `requestType`
        field: String,
    },

    /// A data point carries no usable value
    #[error("Missing value for data point at {time}")]
    MissingValue {
        /// Timestamp of the data point
        time: u64,
    },

    /// A histogram data point has a zero count, so no mean exists
    #[error("Histogram data point at {time} has zero count")]
    DivideByZero {
        /// Timestamp of the data point
        time: u64,
    },

    /// The span kind attribute holds an unrecognized code
    #[error("Unknown span kind: {0}")]
    UnknownSpanKind(String),

    /// The `service.name` of a resource cannot be used in a file name
    #[error("Invalid service name: {0}")]
    InvalidServiceName(String),

    /// A recognized metric name carries the wrong payload shape
    #[error("Metric '{metric}' has unexpected shape: expected {expected}, found {found}")]
    UnexpectedShape {
        /// Metric name
        metric: String,
        /// Shape the recognizer decodes
        expected: &'static str,
        /// Shape the metric actually carries
        found: &'static str,
    },

    /// The payload could not be turned into export requests
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// OTLP/JSON decoding failure
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// OTLP/protobuf decoding failure
    #[error("Protobuf decode error: {0}")]
    Protobuf(#[from] prost::DecodeError),
}

/// Result type alias for series operations
pub type Result<T> = std::result::Result<T, SeriesError>;

impl SeriesError {
    /// Creates a new missing attribute error
    pub fn missing_attribute<S: Into<String>>(field: S) -> Self {
        Self::MissingAttribute {
            field: field.into(),
        }
    }

    /// Creates a new malformed payload error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if this error only affects part of a batch.
    ///
    /// Recoverable errors are recorded as diagnostics; the data point,
    /// metric or resource they belong to is skipped and processing goes on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingAttribute { .. }
                | Self::MissingValue { .. }
                | Self::DivideByZero { .. }
                | Self::UnknownSpanKind(_)
                | Self::InvalidServiceName(_)
                | Self::UnexpectedShape { .. }
        )
    }

    /// Returns the error category for diagnostics and logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingAttribute { .. } => "missing_attribute",
            Self::MissingValue { .. } => "missing_value",
            Self::DivideByZero { .. } => "divide_by_zero",
            Self::UnknownSpanKind(_) => "unknown_span_kind",
            Self::InvalidServiceName(_) => "service_name",
            Self::UnexpectedShape { .. } | Self::MalformedPayload(_) => "payload",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) | Self::Protobuf(_) => "decode",
        }
    }
}
