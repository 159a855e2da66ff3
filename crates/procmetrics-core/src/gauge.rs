//! Gauges: supplier-backed [`Gauge`] and stored-value [`SettableGauge`].

use std::sync::Arc;

use procmetrics_common::error::{MetricsError, Result};

use crate::{
    children::Children,
    metric::{Metric, MetricDataConsumer, MetricDescriptor, MetricType},
    supplier::{ValueSupplier, supply},
    validation::{to_owned_labels, validate_descriptor},
    value::AtomicF64,
};

pub struct GaugeBuilder {
    name: String,
    help: String,
    label_names: Vec<String>,
    supplier: Option<ValueSupplier>,
}

impl GaugeBuilder {
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: Vec::new(),
            supplier: None,
        }
    }

    pub fn with_labels(mut self, label_names: &[&str]) -> Self {
        self.label_names = to_owned_labels(label_names);
        self
    }

    /// Default supplier for the unlabeled child.
    pub fn with_value_supplier<F>(self, f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.with_supplier(Arc::new(f))
    }

    pub fn with_supplier(mut self, supplier: ValueSupplier) -> Self {
        self.supplier = Some(supplier);
        self
    }

    pub fn build(self) -> Result<Gauge> {
        let descriptor =
            validate_descriptor(&self.name, &self.help, MetricType::Gauge, &self.label_names)?;

        if self.supplier.is_some() && !descriptor.label_names.is_empty() {
            return Err(MetricsError::InvalidConfiguration {
                metric: descriptor.name,
                reason: "a default value supplier requires an unlabeled gauge".to_string(),
            });
        }

        let children = Children::new(&descriptor.name, descriptor.label_names.len());
        if let Some(supplier) = self.supplier {
            children.insert(&[], SuppliedChild { supplier })?;
        }

        Ok(Gauge {
            descriptor,
            children,
        })
    }
}

struct SuppliedChild {
    supplier: ValueSupplier,
}

/// A gauge whose children compute their value on every scrape.
pub struct Gauge {
    descriptor: MetricDescriptor,
    children: Children<SuppliedChild>,
}

impl Gauge {
    /// Installs the supplier of the child identified by `label_values`.
    pub fn set_supplier(&self, label_values: &[&str], supplier: ValueSupplier) -> Result<()> {
        self.children
            .insert(label_values, SuppliedChild { supplier })
            .map(|_| ())
    }
}

impl Metric for Gauge {
    fn metric_type(&self) -> MetricType {
        MetricType::Gauge
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
            let value = supply(&self.descriptor.name, &child.supplier);
            consumer.consume_gauge(self, &label_values, value);
        }
    }
}

pub struct SettableGaugeBuilder {
    name: String,
    help: String,
    label_names: Vec<String>,
}

impl SettableGaugeBuilder {
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

    pub fn build(self) -> Result<SettableGauge> {
        let descriptor =
            validate_descriptor(&self.name, &self.help, MetricType::Gauge, &self.label_names)?;
        let children = Children::new(&descriptor.name, descriptor.label_names.len());
        if descriptor.label_names.is_empty() {
            children.insert(&[], GaugeChild::default())?;
        }

        Ok(SettableGauge {
            descriptor,
            children,
        })
    }
}

#[derive(Debug, Default)]
pub struct GaugeChild {
    value: AtomicF64,
}

impl GaugeChild {
    pub fn set(&self, value: f64) {
        self.value.set(value);
    }

    pub fn inc(&self) {
        self.value.add(1.0);
    }

    pub fn inc_by(&self, delta: f64) {
        self.value.add(delta);
    }

    pub fn dec(&self) {
        self.value.add(-1.0);
    }

    pub fn dec_by(&self, delta: f64) {
        self.value.add(-delta);
    }

    pub fn get(&self) -> f64 {
        self.value.get()
    }
}

/// A gauge holding values pushed by application code.
pub struct SettableGauge {
    descriptor: MetricDescriptor,
    children: Children<GaugeChild>,
}

impl SettableGauge {
    pub fn labels(&self, label_values: &[&str]) -> Result<Arc<GaugeChild>> {
        self.children.get_or_create(label_values, GaugeChild::default)
    }

    pub fn set(&self, label_values: &[&str], value: f64) -> Result<()> {
        self.labels(label_values)?.set(value);
        Ok(())
    }

    pub fn inc(&self, label_values: &[&str]) -> Result<()> {
        self.labels(label_values)?.inc();
        Ok(())
    }

    pub fn dec(&self, label_values: &[&str]) -> Result<()> {
        self.labels(label_values)?.dec();
        Ok(())
    }

    pub fn get(&self, label_values: &[&str]) -> Result<f64> {
        Ok(self.labels(label_values)?.get())
    }
}

impl Metric for SettableGauge {
    fn metric_type(&self) -> MetricType {
        MetricType::Gauge
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
            consumer.consume_gauge(self, &label_values, child.get());
        }
    }
}
