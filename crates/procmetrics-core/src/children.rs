//! Per-metric storage of label-value children.
//!
//! Each metric owns one [`Children`] map, so upserts contend only with other
//! accesses to the same metric. Emission works on a cloned snapshot and never
//! holds the lock while computing values.

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use procmetrics_common::error::{MetricsError, Result};
use tracing::warn;

use crate::validation::check_label_count;

type LabelValues = Vec<String>;

pub struct Children<T> {
    metric: String,
    arity: usize,
    series: RwLock<BTreeMap<LabelValues, Arc<T>>>,
}

impl<T> Children<T> {
    pub fn new(metric: &str, arity: usize) -> Self {
        Self {
            metric: metric.to_string(),
            arity,
            series: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the child for `label_values`, creating it with `make` on first access.
    pub fn get_or_create(&self, label_values: &[&str], make: impl FnOnce() -> T) -> Result<Arc<T>> {
        check_label_count(&self.metric, self.arity, label_values.len())?;
        let key = owned(label_values);

        if let Ok(guard) = self.series.read()
            && let Some(existing) = guard.get(&key)
        {
            return Ok(Arc::clone(existing));
        }

        let mut guard = self.series.write().map_err(|_| self.poisoned())?;
        Ok(Arc::clone(guard.entry(key).or_insert_with(|| Arc::new(make()))))
    }

    /// Installs `child` for `label_values`, replacing any previous child.
    pub fn insert(&self, label_values: &[&str], child: T) -> Result<Arc<T>> {
        check_label_count(&self.metric, self.arity, label_values.len())?;
        let child = Arc::new(child);
        self.series
            .write()
            .map_err(|_| self.poisoned())?
            .insert(owned(label_values), Arc::clone(&child));
        Ok(child)
    }

    /// Point-in-time copy of every child, ordered by label values.
    pub fn snapshot(&self) -> Vec<(LabelValues, Arc<T>)> {
        match self.series.read() {
            Ok(guard) => guard
                .iter()
                .map(|(values, child)| (values.clone(), Arc::clone(child)))
                .collect(),
            Err(_) => {
                warn!(metric = %self.metric, "child series lock poisoned, skipping metric");
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.series.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned(&self) -> MetricsError {
        MetricsError::Internal(format!("child series lock poisoned for {}", self.metric))
    }
}

fn owned(label_values: &[&str]) -> LabelValues {
    label_values.iter().map(|value| (*value).to_string()).collect()
}
