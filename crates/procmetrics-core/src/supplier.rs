//! Deferred value computation for supplier-backed metrics.

use std::{
    fmt::Display,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use tracing::{debug, warn};

/// Produces a metric's current value at read time.
pub type ValueSupplier = Arc<dyn Fn() -> f64 + Send + Sync>;

pub fn supplier<F>(f: F) -> ValueSupplier
where
    F: Fn() -> f64 + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a fallible data source; an `Err` is reported as `0.0`.
pub fn fallible_supplier<F, E>(f: F) -> ValueSupplier
where
    F: Fn() -> Result<f64, E> + Send + Sync + 'static,
    E: Display,
{
    Arc::new(move || match f() {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "value supplier failed, reporting 0");
            0.0
        }
    })
}

/// Invokes `supplier`, substituting `0.0` if it panics.
pub(crate) fn supply(metric: &str, supplier: &ValueSupplier) -> f64 {
    match panic::catch_unwind(AssertUnwindSafe(|| supplier())) {
        Ok(value) => value,
        Err(_) => {
            warn!(metric, "value supplier panicked, reporting 0");
            0.0
        }
    }
}
