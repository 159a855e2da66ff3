use std::sync::Arc;

use procmetrics_common::error::Result;
use tracing::debug;

use crate::{
    children::Children,
    metric::{Metric, MetricDataConsumer, MetricDescriptor, MetricType},
    validation::{to_owned_labels, validate_descriptor},
    value::AtomicF64,
};

pub struct CounterBuilder {
    name: String,
    help: String,
    label_names: Vec<String>,
}

impl CounterBuilder {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: Vec::new(),
        }
    }

    pub fn with_labels(mut self, label_names: &[&str]) -> Self {
        self.label_names = to_owned_labels(label_names);
        self
    }

    pub fn build(self) -> Result<Counter> {
        let descriptor =
            validate_descriptor(&self.name, &self.help, MetricType::Counter, &self.label_names)?;
        let children = Children::new(&descriptor.name, descriptor.label_names.len());
        if descriptor.label_names.is_empty() {
            children.insert(&[], CounterChild::default())?;
        }

        Ok(Counter {
            descriptor,
            children,
        })
    }
}

#[derive(Debug, Default)]
pub struct CounterChild {
    value: AtomicF64,
}

impl CounterChild {
    pub fn inc(&self) {
        self.value.add(1.0);
    }

    /// Negative and NaN increments are dropped; a counter only goes up.
    pub fn inc_by(&self, delta: f64) {
        if delta.is_nan() || delta < 0.0 {
            debug!(delta, "ignoring counter increment that is not a non-negative number");
            return;
        }
        self.value.add(delta);
    }

    pub fn get(&self) -> f64 {
        self.value.get()
    }
}

pub struct Counter {
    descriptor: MetricDescriptor,
    children: Children<CounterChild>,
}

impl Counter {
    pub fn labels(&self, label_values: &[&str]) -> Result<Arc<CounterChild>> {
        self.children.get_or_create(label_values, CounterChild::default)
    }

    pub fn inc(&self, label_values: &[&str]) -> Result<()> {
        self.labels(label_values)?.inc();
        Ok(())
    }

    pub fn inc_by(&self, label_values: &[&str], delta: f64) -> Result<()> {
        self.labels(label_values)?.inc_by(delta);
        Ok(())
    }

    pub fn get(&self, label_values: &[&str]) -> Result<f64> {
        Ok(self.labels(label_values)?.get())
    }
}

impl Metric for Counter {
    fn metric_type(&self) -> MetricType {
        MetricType::Counter
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
            consumer.consume_counter(self, &label_values, child.get());
        }
    }
}
