//! Processing pipeline: payload -> recognizer -> series files.

use crate::core::{Config, Diagnostics, Result, ServiceMetadata};
use crate::export::TimeSeriesWriter;
use crate::metrics::{DecodeOptions, MetricKind};
use crate::receiver::{self, PayloadFormat};
use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use std::collections::BTreeSet;
use std::path::Path;

/// Counters and diagnostics for one or more processed requests
#[derive(Debug, Default)]
pub struct ProcessReport {
    /// Requests processed
    pub requests: usize,
    /// Metrics encountered
    pub metrics_seen: usize,
    /// Metrics matched by a recognizer and written
    pub metrics_recognized: usize,
    /// Metrics matched by a recognizer but rejected for their payload shape
    pub metrics_rejected: usize,
    /// Records produced by recognizers
    pub records: usize,
    /// Rows appended to series files
    pub rows_written: usize,
    /// Series files touched
    pub files: BTreeSet<String>,
    /// Non-fatal problems
    pub diagnostics: Diagnostics,
}

impl ProcessReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: ProcessReport) {
        self.requests += other.requests;
        self.metrics_seen += other.metrics_seen;
        self.metrics_recognized += other.metrics_recognized;
        self.metrics_rejected += other.metrics_rejected;
        self.records += other.records;
        self.rows_written += other.rows_written;
        self.files.extend(other.files);
        self.diagnostics.merge(other.diagnostics);
    }
}

/// Drives metric batches through the extraction engine into CSV series
pub struct Application {
    /// Application configuration
    config: Config,
    /// Series sink rooted at the configured results directory
    writer: TimeSeriesWriter,
}

impl Application {
    /// Create a new Application with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let writer = TimeSeriesWriter::new(config.output.results_dir.clone());
        Ok(Self { config, writer })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Series writer in use
    pub fn writer(&self) -> &TimeSeriesWriter {
        &self.writer
    }

    /// Process every recognized metric of one export request.
    ///
    /// A metric with the wrong payload shape is skipped and recorded, and a
    /// resource whose `service.name` cannot name a file is written under the
    /// fallback service. Any I/O failure aborts and propagates.
    pub fn process_request(&self, request: &ExportMetricsServiceRequest) -> Result<ProcessReport> {
        let options = DecodeOptions {
            strict: self.config.processing.strict,
        };
        let mut report = ProcessReport {
            requests: 1,
            ..Default::default()
        };

        for resource_metrics in &request.resource_metrics {
            let fallback = &self.config.processing.fallback_service_name;
            let service = match receiver::service_metadata(resource_metrics.resource.as_ref(), fallback) {
                Ok(service) => service,
                Err(e) if e.is_recoverable() => {
                    report.diagnostics.record("service.name", e);
                    ServiceMetadata::new(fallback)?
                },
                Err(e) => return Err(e),
            };

            for metric in resource_metrics
                .scope_metrics
                .iter()
                .flat_map(|scope| scope.metrics.iter())
            {
                report.metrics_seen += 1;
                let Some(kind) = MetricKind::detect(&metric.name) else {
                    tracing::debug!("Skipping unrecognized metric '{}'", metric.name);
                    continue;
                };

                let recognized = match kind.construct(metric, options) {
                    Ok(recognized) => recognized,
                    Err(e) if e.is_recoverable() => {
                        report.metrics_rejected += 1;
                        report.diagnostics.record(&metric.name, e);
                        continue;
                    },
                    Err(e) => return Err(e),
                };

                let summary = recognized.write(&service, &self.writer)?;
                report.metrics_recognized += 1;
                report.records += recognized.records.len();
                report.rows_written += summary.rows;
                report.files.extend(summary.files);
                report.diagnostics.merge(recognized.diagnostics);
            }
        }

        Ok(report)
    }

    /// Decode a payload file and process every request in it.
    pub fn process_file(&self, path: &Path, format: PayloadFormat) -> Result<ProcessReport> {
        let requests = receiver::read_requests(path, format)?;
        let mut report = ProcessReport::default();
        for request in &requests {
            report.merge(self.process_request(request)?);
        }

        tracing::info!(
            "Processed {:?}: {} requests, {} metrics recognized, {} rows written to {} files",
            path,
            report.requests,
            report.metrics_recognized,
            report.rows_written,
            report.files.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigBuilder;
    use opentelemetry_proto::tonic::common::v1::{any_value::Value, AnyValue, KeyValue};
    use opentelemetry_proto::tonic::metrics::v1::{
        metric::Data, number_data_point, Gauge, Metric, NumberDataPoint, ResourceMetrics,
        ScopeMetrics, Sum,
    };
    use opentelemetry_proto::tonic::resource::v1::Resource;
    use tempfile::TempDir;

    fn app(dir: &TempDir) -> Application {
        let config = ConfigBuilder::new()
            .results_dir(dir.path().join("results"))
            .build()
            .unwrap();
        Application::new(config).unwrap()
    }

    fn calls_point(time: u64) -> NumberDataPoint {
        NumberDataPoint {
            attributes: vec![
                KeyValue {
                    key: "span.kind".to_string(),
                    value: Some(AnyValue {
                        value: Some(Value::StringValue("SPAN_KIND_INTERNAL".to_string())),
                    }),
                },
            ],
            time_unix_nano: time,
            value: Some(number_data_point::Value::AsInt(1)),
            ..Default::default()
        }
    }

    fn named_resource(name: &str, metrics: Vec<Metric>) -> ResourceMetrics {
        ResourceMetrics {
            resource: Some(Resource {
                attributes: vec![KeyValue {
                    key: "service.name".to_string(),
                    value: Some(AnyValue {
                        value: Some(Value::StringValue(name.to_string())),
                    }),
                }],
                dropped_attributes_count: 0,
            }),
            scope_metrics: vec![ScopeMetrics {
                scope: None,
                metrics,
                schema_url: String::new(),
            }],
            schema_url: String::new(),
        }
    }

    fn calls(time: u64) -> Metric {
        Metric {
            name: "calls".to_string(),
            data: Some(Data::Sum(Sum {
                data_points: vec![calls_point(time)],
                aggregation_temporality: 2,
                is_monotonic: true,
            })),
            ..Default::default()
        }
    }

    fn request(metrics: Vec<Metric>) -> ExportMetricsServiceRequest {
        ExportMetricsServiceRequest {
            resource_metrics: vec![ResourceMetrics {
                resource: None,
                scope_metrics: vec![ScopeMetrics {
                    scope: None,
                    metrics,
                    schema_url: String::new(),
                }],
                schema_url: String::new(),
            }],
        }
    }

    #[test]
    fn test_unrecognized_metrics_are_skipped() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let report = app
            .process_request(&request(vec![Metric {
                name: "queue_depth".to_string(),
                ..Default::default()
            }]))
            .unwrap();

        assert_eq!(report.metrics_seen, 1);
        assert_eq!(report.metrics_recognized, 0);
        assert!(report.files.is_empty());
        assert!(!app.writer().root().exists());
    }

    #[test]
    fn test_wrong_shape_is_rejected_not_fatal() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let report = app
            .process_request(&request(vec![Metric {
                name: "calls".to_string(),
                data: Some(Data::Gauge(Gauge {
                    data_points: vec![],
                })),
                ..Default::default()
            }]))
            .unwrap();

        assert_eq!(report.metrics_rejected, 1);
        assert_eq!(report.diagnostics.count("payload"), 1);
    }

    #[test]
    fn test_oversized_service_name_falls_back() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let long_name = "x".repeat(240);

        let report = app
            .process_request(&ExportMetricsServiceRequest {
                resource_metrics: vec![
                    named_resource(&long_name, vec![calls(1)]),
                    named_resource("svcB", vec![calls(2)]),
                ],
            })
            .unwrap();

        assert_eq!(report.diagnostics.count("service_name"), 1);
        assert_eq!(report.rows_written, 2);
        assert!(report.files.contains("unknown_internal_requests_without_errors.csv"));
        assert!(report.files.contains("svcB_internal_requests_without_errors.csv"));
    }

    #[test]
    fn test_report_merge() {
        let mut total = ProcessReport::default();
        let mut part = ProcessReport {
            requests: 1,
            rows_written: 3,
            ..Default::default()
        };
        part.files.insert("a.csv".to_string());
        total.merge(part);
        total.merge(ProcessReport {
            requests: 1,
            ..Default::default()
        });

        assert_eq!(total.requests, 2);
        assert_eq!(total.rows_written, 3);
        assert_eq!(total.files.len(), 1);
    }
}
