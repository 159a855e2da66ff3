//! Build-time checks shared by every metric builder.

use std::collections::HashSet;

use procmetrics_common::error::{MetricsError, Result};

use crate::metric::{MetricDescriptor, MetricType};

/// Validates name, help and label names, returning the descriptor a builder
/// should store.
pub fn validate_descriptor(
    name: &str,
    help: &str,
    metric_type: MetricType,
    label_names: &[String],
) -> Result<MetricDescriptor> {
    validate_metric_name(name)?;
    validate_help(name, help)?;
    validate_label_names(name, metric_type, label_names)?;

    Ok(MetricDescriptor {
        name: name.to_string(),
        help: help.to_string(),
        metric_type,
        label_names: label_names.to_vec(),
    })
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn validate_metric_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(MetricsError::InvalidMetricName(name.to_string()))
    }
}

pub fn validate_help(name: &str, help: &str) -> Result<()> {
    if help.trim().is_empty() {
        return Err(MetricsError::MissingHelp(name.to_string()));
    }
    Ok(())
}

pub fn validate_label_names(
    metric: &str,
    metric_type: MetricType,
    label_names: &[String],
) -> Result<()> {
    let mut seen = HashSet::with_capacity(label_names.len());

    for label in label_names {
        if !is_valid_label_name(label) {
            return Err(MetricsError::InvalidLabelName {
                metric: metric.to_string(),
                label: label.clone(),
            });
        }

        if is_reserved_label_name(metric_type, label) {
            return Err(MetricsError::ReservedLabelName {
                metric: metric.to_string(),
                label: label.clone(),
            });
        }

        if !seen.insert(label.as_str()) {
            return Err(MetricsError::DuplicateLabelName {
                metric: metric.to_string(),
                label: label.clone(),
            });
        }
    }

    Ok(())
}

pub fn check_label_count(metric: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(MetricsError::InvalidLabelCount {
            metric: metric.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn is_valid_label_name(label: &str) -> bool {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn is_reserved_label_name(metric_type: MetricType, label: &str) -> bool {
    if label.starts_with("__") {
        return true;
    }

    match metric_type {
        MetricType::Histogram => label == "le",
        MetricType::Summary => label == "quantile",
        MetricType::Counter | MetricType::Gauge => false,
    }
}

pub(crate) fn to_owned_labels(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| (*label).to_string()).collect()
}
