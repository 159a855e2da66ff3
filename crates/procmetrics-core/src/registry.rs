//! The registry owning every metric of a process.
//!
//! Registration is serialized by a single write lock on the name map, which is
//! the only registry-wide synchronization. Value computation never touches it:
//! exporters take a snapshot of the registered metrics and then let each metric
//! compute its own data.

use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, RwLock},
};

use procmetrics_common::error::{MetricsError, Result};
use tracing::{debug, warn};

use crate::{
    metric::{Metric, MetricDataConsumer, MetricDescriptor},
    registrar::MetricsRegistrar,
};

struct Registered {
    metric: Arc<dyn Metric>,
    // Same allocation as `metric`, kept for typed lookups on re-registration.
    instance: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct Inner {
    index: HashMap<String, usize>,
    entries: Vec<Registered>,
}

#[derive(Default)]
pub struct MetricRegistry {
    inner: RwLock<Inner>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `metric`, or returns the instance already registered under its
    /// name when that instance has the same definition.
    pub fn get_or_register<M: Metric>(&self, metric: M) -> Result<Arc<M>> {
        self.get_or_register_arc(Arc::new(metric))
    }

    pub fn get_or_register_arc<M: Metric>(&self, metric: Arc<M>) -> Result<Arc<M>> {
        let mut inner = self.inner.write().map_err(|_| {
            MetricsError::Internal("failed to acquire metric registry lock".to_string())
        })?;

        if let Some(&position) = inner.index.get(metric.name()) {
            let existing = &inner.entries[position];
            return reuse_existing(existing, metric.as_ref());
        }

        let name = metric.name().to_string();
        debug!(
            metric = %name,
            kind = metric.metric_type().as_prometheus_type(),
            "registering metric"
        );

        let position = inner.entries.len();
        inner.entries.push(Registered {
            metric: metric.clone(),
            instance: metric.clone(),
        });
        inner.index.insert(name, position);
        Ok(metric)
    }

    /// Applies `registrar` to this registry, for fluent composition.
    pub fn register_with(&self, registrar: &dyn MetricsRegistrar) -> Result<&Self> {
        registrar.register_metrics_to(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Metric>> {
        let inner = self.inner.read().ok()?;
        inner
            .index
            .get(name)
            .map(|&position| Arc::clone(&inner.entries[position].metric))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point-in-time snapshot of every registered metric in registration order.
    pub fn metrics(&self) -> Vec<Arc<dyn Metric>> {
        match self.inner.read() {
            Ok(inner) => inner
                .entries
                .iter()
                .map(|entry| Arc::clone(&entry.metric))
                .collect(),
            Err(_) => {
                warn!("metric registry lock poisoned, exporting nothing");
                Vec::new()
            }
        }
    }

    pub fn descriptors(&self) -> Vec<MetricDescriptor> {
        self.metrics().iter().map(|metric| metric.descriptor()).collect()
    }

    /// Streams the data of every registered metric into `consumer`.
    ///
    /// Metrics are sampled one after another; two metrics of the same scrape
    /// may reflect slightly different instants.
    pub fn for_each_metric_data(&self, consumer: &mut dyn MetricDataConsumer) {
        for metric in self.metrics() {
            metric.for_each_metric_data(consumer);
        }
    }
}

fn reuse_existing<M: Metric>(existing: &Registered, candidate: &M) -> Result<Arc<M>> {
    let current = existing.metric.descriptor();
    let requested = candidate.descriptor();
    let conflict = |reason: String| MetricsError::MetricNameConflict {
        name: requested.name.clone(),
        reason,
    };

    if current.metric_type != requested.metric_type {
        return Err(conflict(format!(
            "registered as {}, requested as {}",
            current.metric_type.as_prometheus_type(),
            requested.metric_type.as_prometheus_type()
        )));
    }
    if current.label_names != requested.label_names {
        return Err(conflict(format!(
            "registered with labels {:?}, requested with {:?}",
            current.label_names, requested.label_names
        )));
    }
    if current.help != requested.help {
        return Err(conflict("help text differs".to_string()));
    }

    Arc::clone(&existing.instance)
        .downcast::<M>()
        .map_err(|_| conflict("registered by a different metric implementation".to_string()))
}
