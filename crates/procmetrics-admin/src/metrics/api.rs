use std::{sync::Arc, time::Duration};

use procmetrics_common::error::Result;
use procmetrics_core::{
    Counter, CounterBuilder, Histogram, HistogramBuilder, MetricRegistry, SettableGauge,
    SettableGaugeBuilder,
};
use tracing::warn;

pub struct ApiMetrics {
    requests_total: Arc<Counter>,
    request_duration_seconds: Arc<Histogram>,
    requests_in_flight: Arc<SettableGauge>,
}

impl ApiMetrics {
    pub fn register(registry: &MetricRegistry) -> Result<Self> {
        let requests_total = registry.get_or_register(
            CounterBuilder::new(
                "procmetrics_http_requests_total",
                "Total number of scrape endpoint requests.",
            )
            .with_labels(&["method", "status"])
            .build()?,
        )?;

        let request_duration_seconds = registry.get_or_register(
            HistogramBuilder::new(
                "procmetrics_http_request_duration_seconds",
                "Duration of scrape endpoint requests in seconds.",
            )
            .with_labels(&["method", "status"])
            .build()?,
        )?;

        let requests_in_flight = registry.get_or_register(
            SettableGaugeBuilder::new(
                "procmetrics_http_requests_in_flight",
                "Number of scrape endpoint requests being served.",
            )
            .build()?,
        )?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
            requests_in_flight,
        })
    }

    /// Counts a request as in flight until the returned guard drops.
    pub fn track_in_flight(&self) -> InFlight<'_> {
        self.request_started();
        InFlight(self)
    }

    pub fn request_started(&self) {
        if let Err(err) = self.requests_in_flight.inc(&[]) {
            warn!(error = %err, "failed to update in-flight requests");
        }
    }

    pub fn request_finished(&self) {
        if let Err(err) = self.requests_in_flight.dec(&[]) {
            warn!(error = %err, "failed to update in-flight requests");
        }
    }

    pub fn record_request(&self, method: &str, status: u16, duration: Duration) {
        let status_value = status.to_string();
        let labels = [method, status_value.as_str()];

        let recorded = self.requests_total.inc(&labels).and_then(|()| {
            self.request_duration_seconds
                .observe(&labels, duration.as_secs_f64())
        });
        if let Err(err) = recorded {
            warn!(error = %err, code = err.error_code(), "failed to record request metrics");
        }
    }
}

pub struct InFlight<'a>(&'a ApiMetrics);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.request_finished();
    }
}
