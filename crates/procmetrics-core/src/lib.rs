pub mod children;
pub mod counter;
pub mod exposition;
pub mod gauge;
pub mod histogram;
pub mod metric;
pub mod registrar;
pub mod registry;
pub mod summary;
pub mod supplier;
pub mod validation;
mod value;

pub use counter::{Counter, CounterBuilder, CounterChild};
pub use exposition::{TEXT_CONTENT_TYPE, TextEncoder};
pub use gauge::{Gauge, GaugeBuilder, GaugeChild, SettableGauge, SettableGaugeBuilder};
pub use histogram::{DEFAULT_BUCKETS, Histogram, HistogramBuilder, HistogramChild};
pub use metric::{
    HistogramData, Metric, MetricDataConsumer, MetricDescriptor, MetricType, SummaryData,
};
pub use registrar::MetricsRegistrar;
pub use registry::MetricRegistry;
pub use summary::{Summary, SummaryBuilder, SummaryChild};
pub use supplier::{ValueSupplier, fallible_supplier, supplier};
