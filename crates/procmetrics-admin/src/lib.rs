//! HTTP scrape surface for a [`procmetrics_core::MetricRegistry`].

pub mod handlers;
pub mod metrics;
pub mod router;

pub use metrics::ApiMetrics;
pub use router::{AdminState, admin_router};
