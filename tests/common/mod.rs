//! Common test utilities and fixtures.

#![allow(dead_code)]

use opentelemetry_proto::tonic::{
    collector::metrics::v1::ExportMetricsServiceRequest,
    common::v1::{any_value::Value, AnyValue, KeyValue},
    metrics::v1::{
        metric::Data, number_data_point, Histogram, HistogramDataPoint, Metric, NumberDataPoint,
        ResourceMetrics, ScopeMetrics, Sum,
    },
    resource::v1::Resource,
};
use otlp_series::core::{Config, ConfigBuilder};
use otlp_series::Application;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// String attribute
pub fn attr(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(Value::StringValue(value.to_string())),
        }),
    }
}

/// `span.kind` + `status.code` attributes
pub fn span_attrs(kind: &str, status: &str) -> Vec<KeyValue> {
    vec![attr("span.kind", kind), attr("status.code", status)]
}

/// Counter data point with an integer value
pub fn int_point(time: u64, value: i64, attributes: Vec<KeyValue>) -> NumberDataPoint {
    NumberDataPoint {
        attributes,
        time_unix_nano: time,
        value: Some(number_data_point::Value::AsInt(value)),
        ..Default::default()
    }
}

/// Counter data point with a double value
pub fn double_point(time: u64, value: f64, attributes: Vec<KeyValue>) -> NumberDataPoint {
    NumberDataPoint {
        attributes,
        time_unix_nano: time,
        value: Some(number_data_point::Value::AsDouble(value)),
        ..Default::default()
    }
}

/// Histogram data point
pub fn histogram_point(time: u64, sum: f64, count: u64, attributes: Vec<KeyValue>) -> HistogramDataPoint {
    HistogramDataPoint {
        attributes,
        time_unix_nano: time,
        sum: Some(sum),
        count,
        ..Default::default()
    }
}

/// `calls` sum metric
pub fn calls_metric(data_points: Vec<NumberDataPoint>) -> Metric {
    Metric {
        name: "calls".to_string(),
        data: Some(Data::Sum(Sum {
            data_points,
            aggregation_temporality: 2,
            is_monotonic: true,
        })),
        ..Default::default()
    }
}

/// `duration` histogram metric
pub fn duration_metric(data_points: Vec<HistogramDataPoint>) -> Metric {
    Metric {
        name: "duration".to_string(),
        unit: "ms".to_string(),
        data: Some(Data::Histogram(Histogram {
            data_points,
            aggregation_temporality: 2,
        })),
        ..Default::default()
    }
}

/// Resource metrics for one service
pub fn resource_metrics(service: &str, metrics: Vec<Metric>) -> ResourceMetrics {
    ResourceMetrics {
        resource: Some(Resource {
            attributes: vec![attr("service.name", service)],
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

/// Export request for one service
pub fn export_request(service: &str, metrics: Vec<Metric>) -> ExportMetricsServiceRequest {
    ExportMetricsServiceRequest {
        resource_metrics: vec![resource_metrics(service, metrics)],
    }
}

/// Application writing into a fresh temporary results directory
pub struct TestApp {
    pub dir: TempDir,
    pub app: Application,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|builder| builder)
    }

    pub fn with_config(customize: impl FnOnce(ConfigBuilder) -> ConfigBuilder) -> Self {
        let dir = TempDir::new().unwrap();
        let config: Config = customize(ConfigBuilder::new().results_dir(dir.path().join("results")))
            .build()
            .unwrap();
        let app = Application::new(config).unwrap();
        Self { dir, app }
    }

    pub fn results_dir(&self) -> PathBuf {
        self.dir.path().join("results")
    }

    pub fn read(&self, file_name: &str) -> String {
        read_file(&self.results_dir().join(file_name))
    }

    pub fn exists(&self, file_name: &str) -> bool {
        self.results_dir().join(file_name).exists()
    }

    /// Sorted names of all files in the results directory
    pub fn files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.results_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn read_file(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
