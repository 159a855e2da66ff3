use procmetrics_common::error::Result;

use crate::registry::MetricRegistry;

/// A bundle of related metrics that knows how to add itself to a registry.
///
/// Implementations only add metrics, through [`MetricRegistry::get_or_register`],
/// so applying the same registrar twice, or two registrars declaring the same
/// metric, is harmless. Returning the registry lets registrars nest:
/// `a.register_metrics_to(b.register_metrics_to(&registry)?)?`.
pub trait MetricsRegistrar: Send + Sync {
    fn register_metrics_to<'r>(&self, registry: &'r MetricRegistry) -> Result<&'r MetricRegistry>;
}
