use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use procmetrics_common::error::{MetricsError, Result};
use tracing::warn;

use crate::{
    children::Children,
    metric::{Metric, MetricDataConsumer, MetricDescriptor, MetricType, SummaryData},
    validation::{to_owned_labels, validate_descriptor},
    value::AtomicF64,
};

const DEFAULT_QUANTILES: [f64; 3] = [0.5, 0.9, 0.99];
const DEFAULT_WINDOW_SIZE: usize = 1024;

pub struct SummaryBuilder {
    name: String,
    help: String,
    label_names: Vec<String>,
    quantiles: Vec<f64>,
    window_size: usize,
}

impl SummaryBuilder {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: Vec::new(),
            quantiles: DEFAULT_QUANTILES.to_vec(),
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }

    pub fn with_labels(mut self, label_names: &[&str]) -> Self {
        self.label_names = to_owned_labels(label_names);
        self
    }

    pub fn with_quantiles(mut self, quantiles: &[f64]) -> Self {
        self.quantiles = quantiles.to_vec();
        self
    }

    /// Number of most recent observations quantiles are computed over.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn build(self) -> Result<Summary> {
        let descriptor =
            validate_descriptor(&self.name, &self.help, MetricType::Summary, &self.label_names)?;

        let invalid = |reason: &str| MetricsError::InvalidConfiguration {
            metric: descriptor.name.clone(),
            reason: reason.to_string(),
        };
        if self.quantiles.iter().any(|q| !(0.0..=1.0).contains(q)) {
            return Err(invalid("quantiles must be within [0, 1]"));
        }
        if self.window_size == 0 {
            return Err(invalid("window size must be positive"));
        }

        let children = Children::new(&descriptor.name, descriptor.label_names.len());
        let summary = Summary {
            descriptor,
            quantiles: self.quantiles,
            window_size: self.window_size,
            children,
        };
        if summary.descriptor.label_names.is_empty() {
            summary.children.insert(&[], summary.new_child())?;
        }

        Ok(summary)
    }
}

pub struct SummaryChild {
    window_size: usize,
    window: Mutex<VecDeque<f64>>,
    count: AtomicU64,
    sum: AtomicF64,
}

impl SummaryChild {
    pub fn observe(&self, value: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.add(value);

        match self.window.lock() {
            Ok(mut window) => {
                if window.len() == self.window_size {
                    window.pop_front();
                }
                window.push_back(value);
            }
            Err(_) => warn!("summary window lock poisoned, observation kept in count and sum only"),
        }
    }

    fn data(&self, quantiles: &[f64]) -> SummaryData {
        let mut sorted: Vec<f64> = match self.window.lock() {
            Ok(window) => window.iter().copied().collect(),
            Err(_) => Vec::new(),
        };
        sorted.sort_by(|left, right| left.total_cmp(right));

        SummaryData {
            quantiles: quantiles
                .iter()
                .map(|q| (*q, quantile(&sorted, *q)))
                .collect(),
            count: self.count.load(Ordering::Relaxed),
            sum: self.sum.get(),
        }
    }
}

/// Nearest-rank quantile of an ascending slice; `NaN` when empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

pub struct Summary {
    descriptor: MetricDescriptor,
    quantiles: Vec<f64>,
    window_size: usize,
    children: Children<SummaryChild>,
}

impl Summary {
    pub fn labels(&self, label_values: &[&str]) -> Result<Arc<SummaryChild>> {
        self.children.get_or_create(label_values, || self.new_child())
    }

    pub fn observe(&self, label_values: &[&str], value: f64) -> Result<()> {
        self.labels(label_values)?.observe(value);
        Ok(())
    }

    fn new_child(&self) -> SummaryChild {
        SummaryChild {
            window_size: self.window_size,
            window: Mutex::new(VecDeque::with_capacity(self.window_size.min(DEFAULT_WINDOW_SIZE))),
            count: AtomicU64::new(0),
            sum: AtomicF64::new(0.0),
        }
    }
}

impl Metric for Summary {
    fn metric_type(&self) -> MetricType {
        MetricType::Summary
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
            consumer.consume_summary(self, &label_values, &child.data(&self.quantiles));
        }
    }
}
