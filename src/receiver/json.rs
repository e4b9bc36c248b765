//! OTLP/JSON metrics decoding.
//!
//! Mirrors the JSON encoding written by the collector file exporter:
//! camelCase field names, 64-bit integers as decimal strings (plain numbers
//! are accepted too) and attribute values wrapped as `{"stringValue": ...}`.
//! The JSON model is converted into the `opentelemetry-proto` types used by
//! the rest of the crate.

use crate::core::{Result, SeriesError};
use opentelemetry_proto::tonic::{
    collector::metrics::v1::ExportMetricsServiceRequest,
    common::v1::{any_value, AnyValue, ArrayValue, InstrumentationScope, KeyValue, KeyValueList},
    metrics::v1::{
        metric::Data, number_data_point, ExponentialHistogram, Gauge, Histogram,
        HistogramDataPoint, Metric, NumberDataPoint, ResourceMetrics, ScopeMetrics, Sum, Summary,
    },
    resource::v1::Resource,
};
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;

/// 64-bit integers appear either as JSON numbers or as decimal strings
#[derive(Deserialize)]
#[serde(untagged)]
enum IntRepr<T> {
    Number(T),
    Text(String),
}

impl<T: FromStr> IntRepr<T> {
    fn into_value<E: de::Error>(self) -> std::result::Result<T, E> {
        match self {
            IntRepr::Number(v) => Ok(v),
            IntRepr::Text(s) => s
                .parse()
                .map_err(|_| E::custom(format!("invalid integer string '{}'", s))),
        }
    }
}

fn int<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    IntRepr::<T>::deserialize(deserializer)?.into_value()
}

fn opt_int<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    Option::<IntRepr<T>>::deserialize(deserializer)?
        .map(IntRepr::into_value)
        .transpose()
}

fn int_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    Vec::<IntRepr<T>>::deserialize(deserializer)?
        .into_iter()
        .map(IntRepr::into_value)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonExportRequest {
    #[serde(default)]
    resource_metrics: Vec<JsonResourceMetrics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonResourceMetrics {
    resource: Option<JsonResource>,
    #[serde(default)]
    scope_metrics: Vec<JsonScopeMetrics>,
    #[serde(default)]
    schema_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonResource {
    #[serde(default)]
    attributes: Vec<JsonKeyValue>,
    #[serde(default)]
    dropped_attributes_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonScope {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    attributes: Vec<JsonKeyValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonScopeMetrics {
    scope: Option<JsonScope>,
    #[serde(default)]
    metrics: Vec<JsonMetric>,
    #[serde(default)]
    schema_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonMetric {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    unit: String,
    gauge: Option<JsonGauge>,
    sum: Option<JsonSum>,
    histogram: Option<JsonHistogram>,
    // Shapes the engine never reads are only recognized, not decoded.
    exponential_histogram: Option<serde::de::IgnoredAny>,
    summary: Option<serde::de::IgnoredAny>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonGauge {
    #[serde(default)]
    data_points: Vec<JsonNumberDataPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonSum {
    #[serde(default)]
    data_points: Vec<JsonNumberDataPoint>,
    #[serde(default)]
    aggregation_temporality: i32,
    #[serde(default)]
    is_monotonic: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonHistogram {
    #[serde(default)]
    data_points: Vec<JsonHistogramDataPoint>,
    #[serde(default)]
    aggregation_temporality: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonNumberDataPoint {
    #[serde(default)]
    attributes: Vec<JsonKeyValue>,
    #[serde(default, deserialize_with = "int")]
    start_time_unix_nano: u64,
    #[serde(default, deserialize_with = "int")]
    time_unix_nano: u64,
    #[serde(default, deserialize_with = "opt_int")]
    as_int: Option<i64>,
    as_double: Option<f64>,
    #[serde(default)]
    flags: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonHistogramDataPoint {
    #[serde(default)]
    attributes: Vec<JsonKeyValue>,
    #[serde(default, deserialize_with = "int")]
    start_time_unix_nano: u64,
    #[serde(default, deserialize_with = "int")]
    time_unix_nano: u64,
    #[serde(default, deserialize_with = "int")]
    count: u64,
    sum: Option<f64>,
    #[serde(default, deserialize_with = "int_vec")]
    bucket_counts: Vec<u64>,
    #[serde(default)]
    explicit_bounds: Vec<f64>,
    min: Option<f64>,
    max: Option<f64>,
    #[serde(default)]
    flags: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonKeyValue {
    key: String,
    #[serde(default)]
    value: Option<JsonAnyValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonAnyValue {
    string_value: Option<String>,
    bool_value: Option<bool>,
    #[serde(default, deserialize_with = "opt_int")]
    int_value: Option<i64>,
    double_value: Option<f64>,
    array_value: Option<JsonArrayValue>,
    kvlist_value: Option<JsonKeyValueList>,
}

#[derive(Debug, Deserialize)]
struct JsonArrayValue {
    #[serde(default)]
    values: Vec<JsonAnyValue>,
}

#[derive(Debug, Deserialize)]
struct JsonKeyValueList {
    #[serde(default)]
    values: Vec<JsonKeyValue>,
}

impl From<JsonAnyValue> for AnyValue {
    fn from(json: JsonAnyValue) -> Self {
        use any_value::Value;

        // bytesValue is not decoded; such attributes end up without a value
        let value = if let Some(s) = json.string_value {
            Some(Value::StringValue(s))
        } else if let Some(b) = json.bool_value {
            Some(Value::BoolValue(b))
        } else if let Some(i) = json.int_value {
            Some(Value::IntValue(i))
        } else if let Some(d) = json.double_value {
            Some(Value::DoubleValue(d))
        } else if let Some(array) = json.array_value {
            Some(Value::ArrayValue(ArrayValue {
                values: array.values.into_iter().map(AnyValue::from).collect(),
            }))
        } else {
            json.kvlist_value.map(|list| {
                Value::KvlistValue(KeyValueList {
                    values: convert_attributes(list.values),
                })
            })
        };
        AnyValue { value }
    }
}

fn convert_attributes(attributes: Vec<JsonKeyValue>) -> Vec<KeyValue> {
    attributes
        .into_iter()
        .map(|kv| KeyValue {
            key: kv.key,
            value: kv.value.map(AnyValue::from),
        })
        .collect()
}

fn convert_number_points(points: Vec<JsonNumberDataPoint>) -> Vec<NumberDataPoint> {
    points
        .into_iter()
        .map(|p| {
            // When both are present the integer wins
            let value = match (p.as_int, p.as_double) {
                (Some(i), _) => Some(number_data_point::Value::AsInt(i)),
                (None, Some(d)) => Some(number_data_point::Value::AsDouble(d)),
                (None, None) => None,
            };
            NumberDataPoint {
                attributes: convert_attributes(p.attributes),
                start_time_unix_nano: p.start_time_unix_nano,
                time_unix_nano: p.time_unix_nano,
                value,
                exemplars: Vec::new(),
                flags: p.flags,
            }
        })
        .collect()
}

fn convert_histogram_points(points: Vec<JsonHistogramDataPoint>) -> Vec<HistogramDataPoint> {
    points
        .into_iter()
        .map(|p| HistogramDataPoint {
            attributes: convert_attributes(p.attributes),
            start_time_unix_nano: p.start_time_unix_nano,
            time_unix_nano: p.time_unix_nano,
            count: p.count,
            sum: p.sum,
            bucket_counts: p.bucket_counts,
            explicit_bounds: p.explicit_bounds,
            exemplars: Vec::new(),
            flags: p.flags,
            min: p.min,
            max: p.max,
        })
        .collect()
}

fn convert_metric(json: JsonMetric) -> Result<Metric> {
    let populated = [
        json.gauge.is_some(),
        json.sum.is_some(),
        json.histogram.is_some(),
        json.exponential_histogram.is_some(),
        json.summary.is_some(),
    ]
    .into_iter()
    .filter(|present| *present)
    .count();
    if populated > 1 {
        return Err(SeriesError::malformed(format!(
            "metric '{}' carries {} payload shapes",
            json.name, populated
        )));
    }

    let data = if let Some(gauge) = json.gauge {
        Some(Data::Gauge(Gauge {
            data_points: convert_number_points(gauge.data_points),
        }))
    } else if let Some(sum) = json.sum {
        Some(Data::Sum(Sum {
            data_points: convert_number_points(sum.data_points),
            aggregation_temporality: sum.aggregation_temporality,
            is_monotonic: sum.is_monotonic,
        }))
    } else if let Some(histogram) = json.histogram {
        Some(Data::Histogram(Histogram {
            data_points: convert_histogram_points(histogram.data_points),
            aggregation_temporality: histogram.aggregation_temporality,
        }))
    } else if json.exponential_histogram.is_some() {
        Some(Data::ExponentialHistogram(ExponentialHistogram::default()))
    } else if json.summary.is_some() {
        Some(Data::Summary(Summary::default()))
    } else {
        None
    };

    Ok(Metric {
        name: json.name,
        description: json.description,
        unit: json.unit,
        metadata: Vec::new(),
        data,
    })
}

fn convert_request(json: JsonExportRequest) -> Result<ExportMetricsServiceRequest> {
    let mut resource_metrics = Vec::with_capacity(json.resource_metrics.len());
    for rm in json.resource_metrics {
        let mut scope_metrics = Vec::with_capacity(rm.scope_metrics.len());
        for sm in rm.scope_metrics {
            let metrics = sm
                .metrics
                .into_iter()
                .map(convert_metric)
                .collect::<Result<Vec<_>>>()?;
            scope_metrics.push(ScopeMetrics {
                scope: sm.scope.map(|scope| InstrumentationScope {
                    name: scope.name,
                    version: scope.version,
                    attributes: convert_attributes(scope.attributes),
                    dropped_attributes_count: 0,
                }),
                metrics,
                schema_url: sm.schema_url,
            });
        }

        resource_metrics.push(ResourceMetrics {
            resource: rm.resource.map(|resource| Resource {
                attributes: convert_attributes(resource.attributes),
                dropped_attributes_count: resource.dropped_attributes_count,
            }),
            scope_metrics,
            schema_url: rm.schema_url,
        });
    }

    Ok(ExportMetricsServiceRequest { resource_metrics })
}

/// Decode OTLP/JSON text holding one request or a stream of
/// newline-delimited requests.
pub fn parse_json_requests(text: &str) -> Result<Vec<ExportMetricsServiceRequest>> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<JsonExportRequest>()
        .map(|request| convert_request(request?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALLS_PAYLOAD: &str = r#"{
      "resourceMetrics": [{
        "resource": {"attributes": [{"key": "service.name", "value": {"stringValue": "svcA"}}]},
        "scopeMetrics": [{
          "scope": {"name": "spanmetricsconnector"},
          "metrics": [{
            "name": "calls",
            "sum": {
              "aggregationTemporality": 2,
              "isMonotonic": true,
              "dataPoints": [{
                "attributes": [
                  {"key": "span.kind", "value": {"stringValue": "SPAN_KIND_SERVER"}},
                  {"key": "status.code", "value": {"stringValue": "STATUS_CODE_ERROR"}},
                  {"key": "retries", "value": {"intValue": "3"}}
                ],
                "startTimeUnixNano": "900",
                "timeUnixNano": "1000",
                "asInt": "5"
              }]
            }
          }]
        }]
      }]
    }"#;

    #[test]
    fn test_parse_sum_metric() {
        let requests = parse_json_requests(CALLS_PAYLOAD).unwrap();
        assert_eq!(requests.len(), 1);

        let rm = &requests[0].resource_metrics[0];
        let metric = &rm.scope_metrics[0].metrics[0];
        assert_eq!(metric.name, "calls");
        let Some(Data::Sum(sum)) = &metric.data else {
            panic!("Expected sum");
        };
        assert!(sum.is_monotonic);
        let point = &sum.data_points[0];
        assert_eq!(point.time_unix_nano, 1000);
        assert_eq!(point.start_time_unix_nano, 900);
        assert_eq!(point.value, Some(number_data_point::Value::AsInt(5)));
        assert_eq!(point.attributes.len(), 3);
        assert_eq!(
            point.attributes[2].value,
            Some(AnyValue {
                value: Some(any_value::Value::IntValue(3))
            })
        );
    }

    #[test]
    fn test_parse_histogram_metric() {
        let text = r#"{"resourceMetrics":[{"scopeMetrics":[{"metrics":[{
            "name": "duration",
            "unit": "ms",
            "histogram": {"aggregationTemporality": 2, "dataPoints": [{
                "timeUnixNano": 2000, "count": "3", "sum": 300,
                "bucketCounts": ["1", 2], "explicitBounds": [10.0]
            }]}
        }]}]}]}"#;

        let requests = parse_json_requests(text).unwrap();
        let metric = &requests[0].resource_metrics[0].scope_metrics[0].metrics[0];
        let Some(Data::Histogram(histogram)) = &metric.data else {
            panic!("Expected histogram");
        };
        let point = &histogram.data_points[0];
        assert_eq!(point.time_unix_nano, 2000);
        assert_eq!(point.count, 3);
        assert_eq!(point.sum, Some(300.0));
        assert_eq!(point.bucket_counts, vec![1, 2]);
        assert!(requests[0].resource_metrics[0].resource.is_none());
    }

    #[test]
    fn test_parse_newline_delimited_requests() {
        let line = CALLS_PAYLOAD.replace('\n', "");
        let text = format!("{}\n{}\n", line, line);
        let requests = parse_json_requests(&text).unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn test_double_value_and_missing_value() {
        let text = r#"{"resourceMetrics":[{"scopeMetrics":[{"metrics":[{
            "name": "calls",
            "sum": {"dataPoints": [
                {"timeUnixNano": "1", "asDouble": 2.5},
                {"timeUnixNano": "2"}
            ]}
        }]}]}]}"#;

        let requests = parse_json_requests(text).unwrap();
        let metric = &requests[0].resource_metrics[0].scope_metrics[0].metrics[0];
        let Some(Data::Sum(sum)) = &metric.data else {
            panic!("Expected sum");
        };
        assert_eq!(sum.data_points[0].value, Some(number_data_point::Value::AsDouble(2.5)));
        assert_eq!(sum.data_points[1].value, None);
    }

    #[test]
    fn test_two_shapes_rejected() {
        let text = r#"{"resourceMetrics":[{"scopeMetrics":[{"metrics":[{
            "name": "calls", "sum": {"dataPoints": []}, "gauge": {"dataPoints": []}
        }]}]}]}"#;

        let err = parse_json_requests(text).unwrap_err();
        assert!(matches!(err, SeriesError::MalformedPayload(_)));
    }

    #[test]
    fn test_unsupported_shape_is_kept_empty() {
        let text = r#"{"resourceMetrics":[{"scopeMetrics":[{"metrics":[{
            "name": "latency", "summary": {"dataPoints": [{"count": "1", "sum": 2.0}]}
        }]}]}]}"#;

        let requests = parse_json_requests(text).unwrap();
        let metric = &requests[0].resource_metrics[0].scope_metrics[0].metrics[0];
        assert!(matches!(metric.data, Some(Data::Summary(_))));
    }

    #[test]
    fn test_invalid_integer_string() {
        let text = r#"{"resourceMetrics":[{"scopeMetrics":[{"metrics":[{
            "name": "calls", "sum": {"dataPoints": [{"timeUnixNano": "soon"}]}
        }]}]}]}"#;

        let err = parse_json_requests(text).unwrap_err();
        assert_eq!(err.category(), "decode");
    }
}
