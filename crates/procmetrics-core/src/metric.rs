//! The contract shared by every metric type.
//!
//! A metric never hands out its samples as a collection. Exporters implement
//! [`MetricDataConsumer`] and the metric pushes one call per child into it,
//! computing supplier-backed values at that moment.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricType {
    pub fn as_prometheus_type(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::Summary => "summary",
        }
    }
}

/// Structural definition of a metric, compared on re-registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub label_names: Vec<String>,
}

impl MetricDescriptor {
    pub fn new(name: &str, help: &str, metric_type: MetricType, label_names: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            metric_type,
            label_names: label_names.iter().map(|label| (*label).to_string()).collect(),
        }
    }
}

pub trait Metric: Send + Sync + 'static {
    fn metric_type(&self) -> MetricType;

    fn name(&self) -> &str;

    fn help(&self) -> &str;

    /// Ordered label names shared by every child; empty for an unlabeled metric.
    fn label_names(&self) -> &[String];

    /// Pushes the current data of every child into `consumer`.
    ///
    /// Supplier-backed values are computed during this call, once per child.
    /// Implementations must not hold internal locks while a supplier runs and
    /// must substitute `0.0` for a failing supplier instead of aborting.
    fn for_each_metric_data(&self, consumer: &mut dyn MetricDataConsumer);

    fn descriptor(&self) -> MetricDescriptor {
        MetricDescriptor {
            name: self.name().to_string(),
            help: self.help().to_string(),
            metric_type: self.metric_type(),
            label_names: self.label_names().to_vec(),
        }
    }
}

/// Histogram payload of a single child.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramData {
    /// `(upper bound, cumulative count)` pairs, ending with `+Inf`.
    pub buckets: Vec<(f64, u64)>,
    pub count: u64,
    pub sum: f64,
}

/// Summary payload of a single child.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryData {
    /// `(quantile, value)` pairs in configured order.
    pub quantiles: Vec<(f64, f64)>,
    pub count: u64,
    pub sum: f64,
}

/// Receives samples streamed out of [`Metric::for_each_metric_data`].
pub trait MetricDataConsumer {
    fn consume_counter(&mut self, metric: &dyn Metric, label_values: &[String], value: f64);

    fn consume_gauge(&mut self, metric: &dyn Metric, label_values: &[String], value: f64);

    fn consume_histogram(
        &mut self,
        metric: &dyn Metric,
        label_values: &[String],
        data: &HistogramData,
    );

    fn consume_summary(
        &mut self,
        metric: &dyn Metric,
        label_values: &[String],
        data: &SummaryData,
    );
}
