use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use procmetrics_common::error::{MetricsError, Result};

use crate::{
    children::Children,
    metric::{HistogramData, Metric, MetricDataConsumer, MetricDescriptor, MetricType},
    validation::{to_owned_labels, validate_descriptor},
    value::AtomicF64,
};

pub const DEFAULT_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

pub struct HistogramBuilder {
    name: String,
    help: String,
    label_names: Vec<String>,
    buckets: Vec<f64>,
}

impl HistogramBuilder {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: Vec::new(),
            buckets: DEFAULT_BUCKETS.to_vec(),
        }
    }

    pub fn with_labels(mut self, label_names: &[&str]) -> Self {
        self.label_names = to_owned_labels(label_names);
        self
    }

    /// Finite, strictly increasing upper bounds. `+Inf` is always appended.
    pub fn with_buckets(mut self, buckets: &[f64]) -> Self {
        self.buckets = buckets.to_vec();
        self
    }

    pub fn build(self) -> Result<Histogram> {
        let descriptor =
            validate_descriptor(&self.name, &self.help, MetricType::Histogram, &self.label_names)?;
        validate_buckets(&descriptor.name, &self.buckets)?;

        let children = Children::new(&descriptor.name, descriptor.label_names.len());
        let histogram = Histogram {
            descriptor,
            buckets: self.buckets,
            children,
        };
        if histogram.descriptor.label_names.is_empty() {
            histogram.children.insert(&[], histogram.new_child())?;
        }

        Ok(histogram)
    }
}

fn validate_buckets(metric: &str, buckets: &[f64]) -> Result<()> {
    let invalid = |reason: &str| MetricsError::InvalidBuckets {
        metric: metric.to_string(),
        reason: reason.to_string(),
    };

    if buckets.is_empty() {
        return Err(invalid("at least one bucket is required"));
    }
    if buckets.iter().any(|bound| !bound.is_finite()) {
        return Err(invalid("bucket bounds must be finite"));
    }
    if buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(invalid("bucket bounds must be strictly increasing"));
    }
    Ok(())
}

pub struct HistogramChild {
    bounds: Arc<[f64]>,
    // One slot per bound plus the +Inf overflow slot; not cumulative.
    bucket_counts: Vec<AtomicU64>,
    sum: AtomicF64,
}

impl HistogramChild {
    pub fn observe(&self, value: f64) {
        let index = self
            .bounds
            .iter()
            .position(|bound| value <= *bound)
            .unwrap_or(self.bounds.len());

        if let Some(bucket) = self.bucket_counts.get(index) {
            bucket.fetch_add(1, Ordering::Relaxed);
        }
        self.sum.add(value);
    }

    fn data(&self) -> HistogramData {
        let mut cumulative = 0_u64;
        let mut buckets = Vec::with_capacity(self.bucket_counts.len());
        for (index, slot) in self.bucket_counts.iter().enumerate() {
            cumulative = cumulative.saturating_add(slot.load(Ordering::Relaxed));
            let bound = self.bounds.get(index).copied().unwrap_or(f64::INFINITY);
            buckets.push((bound, cumulative));
        }

        // `_count` is the `+Inf` bucket so the two always agree.
        HistogramData {
            buckets,
            count: cumulative,
            sum: self.sum.get(),
        }
    }
}

pub struct Histogram {
    descriptor: MetricDescriptor,
    buckets: Vec<f64>,
    children: Children<HistogramChild>,
}

impl Histogram {
    pub fn labels(&self, label_values: &[&str]) -> Result<Arc<HistogramChild>> {
        self.children.get_or_create(label_values, || self.new_child())
    }

    pub fn observe(&self, label_values: &[&str], value: f64) -> Result<()> {
        self.labels(label_values)?.observe(value);
        Ok(())
    }

    fn new_child(&self) -> HistogramChild {
        HistogramChild {
            bounds: Arc::from(self.buckets.as_slice()),
            bucket_counts: (0..self.buckets.len() + 1)
                .map(|_| AtomicU64::new(0))
                .collect(),
            sum: AtomicF64::new(0.0),
        }
    }
}

impl Metric for Histogram {
    fn metric_type(&self) -> MetricType {
        MetricType::Histogram
    }

    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn help(&self) -> &str {
        &self.descriptor.help
    }

    fn label_names(&self) -> &[String] {
        &self.descriptor.label_names
    }

    fn for_each_metric_data(&self, consumer: &mut dyn MetricDataConsumer) {
        for (label_values, child) in self.children.snapshot() {
            consumer.consume_histogram(self, &label_values, &child.data());
        }
    }
}
