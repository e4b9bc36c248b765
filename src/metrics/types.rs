//! Record and series-key types produced by the extraction engine.

use crate::core::ServiceName;
use crate::metrics::classify::Category;
use std::fmt;

/// Numeric value carried by a data point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    /// Integer counter value (`asInt`)
    Int(i64),
    /// Floating-point value (`asDouble`, histogram means)
    Double(f64),
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SampleValue::Int(v) => write!(f, "{}", v),
            SampleValue::Double(v) if v.is_nan() => f.write_str("nan"),
            SampleValue::Double(v) if v.is_infinite() => {
                f.write_str(if v > 0.0 { "inf" } else { "-inf" })
            },
            // Whole doubles keep a trailing ".0" so they stay distinguishable from ints.
            SampleValue::Double(v) if v.fract() == 0.0 => write!(f, "{:.1}", v),
            SampleValue::Double(v) => write!(f, "{}", v),
        }
    }
}

/// Time and value decoded from a data point, before enrichment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialRecord {
    /// Timestamp in nanoseconds, kept as an opaque ordinal
    pub time: u64,
    /// Decoded value; `None` is a gap
    pub value: Option<SampleValue>,
}

impl PartialRecord {
    /// Attach a category, producing a record without an error flag
    pub fn classified(self, category: Category) -> NormalizedRecord {
        NormalizedRecord {
            time: self.time,
            value: self.value,
            category,
            is_error: None,
        }
    }
}

/// A fully enriched data point, ready to be written
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRecord {
    /// Timestamp in nanoseconds
    pub time: u64,
    /// Value; `None` is written as an empty field
    pub value: Option<SampleValue>,
    /// Request category derived from span kind
    pub category: Category,
    /// Error flag, only present on non-internal counter records
    pub is_error: Option<bool>,
}

impl NormalizedRecord {
    /// Set the error flag
    pub fn with_error(mut self, is_error: bool) -> Self {
        self.is_error = Some(is_error);
        self
    }

    /// Error bucket this record belongs to; records without a flag count as non-errors
    pub fn error_bucket(&self) -> ErrorBucket {
        if self.is_error.unwrap_or(false) {
            ErrorBucket::WithErrors
        } else {
            ErrorBucket::WithoutErrors
        }
    }
}

/// Error/non-error split for request counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorBucket {
    /// Status code carries the error marker
    WithErrors,
    /// Any other status
    WithoutErrors,
}

impl ErrorBucket {
    /// File name fragment
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorBucket::WithErrors => "with_errors",
            ErrorBucket::WithoutErrors => "without_errors",
        }
    }
}

/// Which series a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesKind {
    /// Request counts, split by error bucket
    Requests(ErrorBucket),
    /// Mean request duration
    Duration,
}

/// Structured identity of one output file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileKey {
    /// Service that produced the records
    pub service: ServiceName,
    /// Request category
    pub category: Category,
    /// Series kind
    pub series: SeriesKind,
}

impl FileKey {
    /// Render the deterministic file name for this key
    pub fn file_name(&self) -> String {
        let service = self.service.file_component();
        let category = self.category.as_str();
        match self.series {
            SeriesKind::Requests(bucket) => {
                format!("{}_{}_requests_{}.csv", service, category, bucket.as_str())
            },
            SeriesKind::Duration => format!("{}_{}_request_duration.csv", service, category),
        }
    }
}
