//! The standard `process_*` metrics.

use std::sync::Arc;

use procmetrics_common::error::Result;
use procmetrics_core::{Gauge, GaugeBuilder, MetricRegistry, MetricsRegistrar};
use tracing::debug;

use crate::{
    fs::{FileSystem, RealFs},
    probe::PlatformCapabilities,
    source::ProcessSource,
    status::{ProcStatusReader, StatusSource},
};

pub struct StandardMetrics<F = RealFs> {
    source: Arc<ProcessSource<F>>,
    status: Arc<dyn StatusSource>,
    capabilities: PlatformCapabilities,
}

impl StandardMetrics<RealFs> {
    pub fn new() -> Self {
        Self::with_filesystem(Arc::new(RealFs), PlatformCapabilities::detect())
    }
}

impl Default for StandardMetrics<RealFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem + 'static> StandardMetrics<F> {
    pub fn with_filesystem(fs: Arc<F>, capabilities: PlatformCapabilities) -> Self {
        Self {
            source: Arc::new(ProcessSource::new(Arc::clone(&fs))),
            status: Arc::new(ProcStatusReader::new(fs)),
            capabilities,
        }
    }

    /// Replaces the status source backing the memory gauges.
    pub fn with_status_source(mut self, status: Arc<dyn StatusSource>) -> Self {
        self.status = status;
        self
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    fn process_gauge(
        &self,
        name: &str,
        help: &str,
        read: fn(&ProcessSource<F>) -> f64,
    ) -> Result<Gauge> {
        let source = Arc::clone(&self.source);
        GaugeBuilder::new(name, help)
            .with_value_supplier(move || read(&source))
            .build()
    }

    fn status_gauge(&self, name: &str, help: &str, key: &'static str) -> Result<Gauge> {
        let status = Arc::clone(&self.status);
        GaugeBuilder::new(name, help)
            .with_value_supplier(move || status.lookup(key))
            .build()
    }
}

impl<F: FileSystem + 'static> MetricsRegistrar for StandardMetrics<F> {
    fn register_metrics_to<'r>(&self, registry: &'r MetricRegistry) -> Result<&'r MetricRegistry> {
        registry.get_or_register(self.process_gauge(
            "process_cpu_seconds_total",
            "Total user and system CPU time spent in seconds.",
            ProcessSource::cpu_seconds_total,
        )?)?;
        registry.get_or_register(self.process_gauge(
            "process_start_time_seconds",
            "Start time of the process since unix epoch in seconds.",
            ProcessSource::start_time_seconds,
        )?)?;

        if self.capabilities.file_descriptors {
            registry.get_or_register(self.process_gauge(
                "process_open_fds",
                "Number of open file descriptors.",
                ProcessSource::open_fds,
            )?)?;
            registry.get_or_register(self.process_gauge(
                "process_max_fds",
                "Maximum number of open file descriptors.",
                ProcessSource::max_fds,
            )?)?;
        }

        // No portable way to read memory usage; only Linux exposes it here.
        if self.capabilities.memory_status {
            registry.get_or_register(self.status_gauge(
                "process_virtual_memory_bytes",
                "Virtual memory size in bytes.",
                "VmSize:",
            )?)?;
            registry.get_or_register(self.status_gauge(
                "process_resident_memory_bytes",
                "Resident memory size in bytes.",
                "VmRSS:",
            )?)?;
        }

        debug!(capabilities = ?self.capabilities, "standard process metrics registered");
        Ok(registry)
    }
}
