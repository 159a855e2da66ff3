use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use procmetrics_common::error::Result;
use procmetrics_core::{MetricRegistry, TextEncoder};

use crate::{handlers, metrics::ApiMetrics};

pub struct AdminState {
    pub registry: Arc<MetricRegistry>,
    pub api_metrics: Arc<ApiMetrics>,
    pub encoder: TextEncoder,
}

impl AdminState {
    /// Registers the HTTP request metrics into `registry` and wraps it for the router.
    pub fn new(registry: Arc<MetricRegistry>, encoder: TextEncoder) -> Result<Self> {
        let api_metrics = Arc::new(ApiMetrics::register(registry.as_ref())?);

        Ok(Self {
            registry,
            api_metrics,
            encoder,
        })
    }
}

pub fn admin_router(state: Arc<AdminState>) -> Router {
    Router::new()
        .route("/health/live", get(handlers::health::health_live))
        .route("/metrics", get(handlers::metrics::prometheus_metrics))
        .route("/metrics/catalog", get(handlers::metrics::metric_catalog))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            handlers::metrics::track_api_metrics,
        ))
        .with_state(state)
}
