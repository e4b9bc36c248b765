//! Metric recognizers: name matching, enrichment, grouping and writing.

use crate::core::{Diagnostics, Result, ServiceMetadata};
use crate::export::TimeSeriesWriter;
use crate::metrics::attributes::{extract_attributes, REQUEST_TYPE, SPAN_ATTRIBUTES, STATUS};
use crate::metrics::classify::{classify_span_kind, is_error_status, Category};
use crate::metrics::decode::{decode_histogram, decode_sum, DecodeOptions};
use crate::metrics::types::{FileKey, NormalizedRecord, PartialRecord, SeriesKind};
use opentelemetry_proto::tonic::common::v1::KeyValue;
use opentelemetry_proto::tonic::metrics::v1::Metric;
use std::collections::BTreeMap;

/// The closed set of metrics this crate knows how to turn into series
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKind {
    /// Request counter (`calls`, sum)
    Calls,
    /// Request latency (`duration`, histogram)
    Duration,
}

impl MetricKind {
    /// All recognizers in priority order
    pub const ALL: [MetricKind; 2] = [MetricKind::Calls, MetricKind::Duration];

    /// Metric name this recognizer matches
    pub fn metric_name(self) -> &'static str {
        match self {
            MetricKind::Calls => "calls",
            MetricKind::Duration => "duration",
        }
    }

    /// Whether this recognizer handles the metric name
    pub fn matches(self, name: &str) -> bool {
        name == self.metric_name()
    }

    /// First recognizer, in priority order, that matches the name
    pub fn detect(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.matches(name))
    }

    /// Decode and enrich every data point of the metric.
    ///
    /// Fails only when the metric does not carry the shape this recognizer
    /// reads. Per-point problems end up in the returned diagnostics.
    pub fn construct(self, metric: &Metric, options: DecodeOptions) -> Result<RecognizedMetric> {
        let mut diagnostics = Diagnostics::new();
        let records = match self {
            MetricKind::Calls => decode_sum(metric, options, &mut diagnostics, |point, partial, diags| {
                enrich_calls(&metric.name, &point.attributes, partial, diags)
            })?,
            MetricKind::Duration => decode_histogram(metric, &mut diagnostics, |point, partial, diags| {
                enrich_duration(&metric.name, &point.attributes, partial, diags)
            })?,
        };

        Ok(RecognizedMetric {
            kind: self,
            metric_name: metric.name.clone(),
            records,
            diagnostics,
        })
    }
}

/// Category for a span kind, routing unknown kinds to [`Category::Unknown`]
fn categorize(metric: &str, kind: &str, diagnostics: &mut Diagnostics) -> Category {
    classify_span_kind(kind).unwrap_or_else(|e| {
        diagnostics.record(metric, e);
        Category::Unknown
    })
}

fn enrich_calls(
    metric: &str,
    attributes: &[KeyValue],
    partial: PartialRecord,
    diagnostics: &mut Diagnostics,
) -> Result<NormalizedRecord> {
    let metadata = extract_attributes(attributes, SPAN_ATTRIBUTES);
    let category = categorize(metric, metadata.require(REQUEST_TYPE)?, diagnostics);
    let record = partial.classified(category);
    if !category.tracks_errors() {
        return Ok(record);
    }

    let status = metadata.require(STATUS)?;
    Ok(record.with_error(is_error_status(status)))
}

fn enrich_duration(
    metric: &str,
    attributes: &[KeyValue],
    partial: PartialRecord,
    diagnostics: &mut Diagnostics,
) -> Result<NormalizedRecord> {
    // status.code is extracted alongside span.kind but not used for durations
    let metadata = extract_attributes(attributes, SPAN_ATTRIBUTES);
    let category = categorize(metric, metadata.require(REQUEST_TYPE)?, diagnostics);
    Ok(partial.classified(category))
}

/// Outcome of writing one recognized metric
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// Rows appended across all files
    pub rows: usize,
    /// Files written, in key order
    pub files: Vec<String>,
}

/// A metric decoded by one of the recognizers, buffered until written
#[derive(Debug)]
pub struct RecognizedMetric {
    /// Recognizer that produced it
    pub kind: MetricKind,
    /// Source metric name
    pub metric_name: String,
    /// Records in data-point order
    pub records: Vec<NormalizedRecord>,
    /// Non-fatal problems met while decoding
    pub diagnostics: Diagnostics,
}

impl RecognizedMetric {
    fn file_key(&self, service: &ServiceMetadata, record: &NormalizedRecord) -> FileKey {
        let series = match self.kind {
            MetricKind::Calls => SeriesKind::Requests(record.error_bucket()),
            MetricKind::Duration => SeriesKind::Duration,
        };
        FileKey {
            service: service.service_name.clone(),
            category: record.category,
            series,
        }
    }

    /// Group records by output file, keeping data-point order within a group
    pub fn group(&self, service: &ServiceMetadata) -> BTreeMap<FileKey, Vec<&NormalizedRecord>> {
        let mut groups: BTreeMap<FileKey, Vec<&NormalizedRecord>> = BTreeMap::new();
        for record in &self.records {
            groups
                .entry(self.file_key(service, record))
                .or_default()
                .push(record);
        }
        groups
    }

    /// Append every record to its series file, one handle per file
    pub fn write(&self, service: &ServiceMetadata, writer: &TimeSeriesWriter) -> Result<WriteSummary> {
        let mut summary = WriteSummary::default();
        for (key, records) in self.group(service) {
            let file_name = key.file_name();
            summary.rows += writer.write_series(&file_name, records)?;
            summary.files.push(file_name);
        }

        tracing::debug!(
            "Wrote {} rows of '{}' for {} across {} files",
            summary.rows,
            self.metric_name,
            service.service_name,
            summary.files.len()
        );
        Ok(summary)
    }
}
