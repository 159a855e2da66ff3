use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid metric name: {0:?}")]
    InvalidMetricName(String),
    #[error("metric {0} requires a non-empty help text")]
    MissingHelp(String),
    #[error("invalid label name {label:?} on metric {metric}")]
    InvalidLabelName { metric: String, label: String },
    #[error("duplicate label name {label:?} on metric {metric}")]
    DuplicateLabelName { metric: String, label: String },
    #[error("label name {label:?} is reserved on metric {metric}")]
    ReservedLabelName { metric: String, label: String },
    #[error("invalid buckets on metric {metric}: {reason}")]
    InvalidBuckets { metric: String, reason: String },
    #[error("invalid configuration for metric {metric}: {reason}")]
    InvalidConfiguration { metric: String, reason: String },
    #[error("metric name conflict: {name} ({reason})")]
    MetricNameConflict { name: String, reason: String },
    #[error("invalid label count on metric {metric}: expected={expected}, actual={actual}")]
    InvalidLabelCount {
        metric: String,
        expected: usize,
        actual: usize,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl MetricsError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidMetricName(_) => "InvalidMetricName",
            Self::MissingHelp(_) => "MissingHelp",
            Self::InvalidLabelName { .. } => "InvalidLabelName",
            Self::DuplicateLabelName { .. } => "DuplicateLabelName",
            Self::ReservedLabelName { .. } => "ReservedLabelName",
            Self::InvalidBuckets { .. } => "InvalidBuckets",
            Self::InvalidConfiguration { .. } => "InvalidConfiguration",
            Self::MetricNameConflict { .. } => "MetricNameConflict",
            Self::InvalidLabelCount { .. } => "InvalidLabelCount",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Errors raised while building a metric, before it ever reaches a registry.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidMetricName(_)
                | Self::MissingHelp(_)
                | Self::InvalidLabelName { .. }
                | Self::DuplicateLabelName { .. }
                | Self::ReservedLabelName { .. }
                | Self::InvalidBuckets { .. }
                | Self::InvalidConfiguration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;
