//! Data point decoding for counter (sum) and histogram metrics.
//!
//! Both decoders walk the data points in order, build a [`PartialRecord`]
//! and hand it to an enrichment callback. Problems local to one data point
//! are recorded in [`Diagnostics`] and never abort the batch; only a metric
//! with the wrong payload shape is rejected as a whole.

use crate::core::{Diagnostics, Result, SeriesError};
use crate::metrics::types::{NormalizedRecord, PartialRecord, SampleValue};
use opentelemetry_proto::tonic::metrics::v1::{
    metric::Data, number_data_point, HistogramDataPoint, Metric, NumberDataPoint,
};

/// Options shared by the decoders
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Record counter points without a value as `MissingValue` diagnostics
    pub strict: bool,
}

/// Name of the payload shape a metric carries
pub fn shape_name(data: Option<&Data>) -> &'static str {
    match data {
        Some(Data::Gauge(_)) => "gauge",
        Some(Data::Sum(_)) => "sum",
        Some(Data::Histogram(_)) => "histogram",
        Some(Data::ExponentialHistogram(_)) => "exponential_histogram",
        Some(Data::Summary(_)) => "summary",
        None => "none",
    }
}

fn unexpected_shape(metric: &Metric, expected: &'static str) -> SeriesError {
    SeriesError::UnexpectedShape {
        metric: metric.name.clone(),
        expected,
        found: shape_name(metric.data.as_ref()),
    }
}

/// Read a counter value, preferring the integer representation
pub fn number_value(point: &NumberDataPoint) -> Option<SampleValue> {
    match point.value {
        Some(number_data_point::Value::AsInt(v)) => Some(SampleValue::Int(v)),
        Some(number_data_point::Value::AsDouble(v)) => Some(SampleValue::Double(v)),
        None => None,
    }
}

/// Mean of a histogram data point
pub fn histogram_mean(point: &HistogramDataPoint) -> Result<f64> {
    let time = point.time_unix_nano;
    if point.count == 0 {
        return Err(SeriesError::DivideByZero { time });
    }
    let sum = point.sum.ok_or(SeriesError::MissingValue { time })?;
    Ok(sum / point.count as f64)
}

/// Decode every data point of a `Sum` metric.
///
/// One record is produced per data point unless enrichment fails for it.
/// A point without a value becomes a gap. Recoverable enrichment errors are
/// recorded; any other error aborts the metric.
pub fn decode_sum<F>(
    metric: &Metric,
    options: DecodeOptions,
    diagnostics: &mut Diagnostics,
    mut enrich: F,
) -> Result<Vec<NormalizedRecord>>
where
    F: FnMut(&NumberDataPoint, PartialRecord, &mut Diagnostics) -> Result<NormalizedRecord>,
{
    let Some(Data::Sum(sum)) = &metric.data else {
        return Err(unexpected_shape(metric, "sum"));
    };

    let mut records = Vec::with_capacity(sum.data_points.len());
    for point in &sum.data_points {
        let partial = PartialRecord {
            time: point.time_unix_nano,
            value: number_value(point),
        };

        if partial.value.is_none() {
            if options.strict {
                diagnostics.record(&metric.name, SeriesError::MissingValue { time: partial.time });
            } else {
                tracing::debug!(
                    "Metric '{}' data point at {} has no value, keeping gap",
                    metric.name,
                    partial.time
                );
            }
        }

        match enrich(point, partial, diagnostics) {
            Ok(record) => records.push(record),
            Err(e) if e.is_recoverable() => diagnostics.record(&metric.name, e),
            Err(e) => return Err(e),
        }
    }

    Ok(records)
}

/// Decode every data point of a `Histogram` metric into its mean.
///
/// Points with a zero count or no sum are skipped.
pub fn decode_histogram<F>(
    metric: &Metric,
    diagnostics: &mut Diagnostics,
    mut enrich: F,
) -> Result<Vec<NormalizedRecord>>
where
    F: FnMut(&HistogramDataPoint, PartialRecord, &mut Diagnostics) -> Result<NormalizedRecord>,
{
    let Some(Data::Histogram(histogram)) = &metric.data else {
        return Err(unexpected_shape(metric, "histogram"));
    };

    let mut records = Vec::with_capacity(histogram.data_points.len());
    for point in &histogram.data_points {
        let mean = match histogram_mean(point) {
            Ok(mean) => mean,
            Err(e) => {
                diagnostics.record(&metric.name, e);
                continue;
            },
        };

        let partial = PartialRecord {
            time: point.time_unix_nano,
            value: Some(SampleValue::Double(mean)),
        };

        match enrich(point, partial, diagnostics) {
            Ok(record) => records.push(record),
            Err(e) if e.is_recoverable() => diagnostics.record(&metric.name, e),
            Err(e) => return Err(e),
        }
    }

    Ok(records)
}
