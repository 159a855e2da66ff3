pub mod api;

pub use api::{ApiMetrics, InFlight};
