use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicU64, Ordering},
    },
    thread,
};

use procmetrics_common::MetricsError;
use procmetrics_core::{
    CounterBuilder, Gauge, GaugeBuilder, HistogramBuilder, HistogramData, Metric,
    MetricDataConsumer, MetricRegistry, MetricType, SummaryBuilder, SummaryData, TextEncoder,
};

#[derive(Debug, Clone, PartialEq)]
struct Sample {
    name: String,
    metric_type: MetricType,
    label_values: Vec<String>,
    value: f64,
}

#[derive(Default)]
struct Collector {
    samples: Vec<Sample>,
}

impl Collector {
    fn push(&mut self, metric: &dyn Metric, label_values: &[String], value: f64) {
        self.samples.push(Sample {
            name: metric.name().to_string(),
            metric_type: metric.metric_type(),
            label_values: label_values.to_vec(),
            value,
        });
    }
}

impl MetricDataConsumer for Collector {
    fn consume_counter(&mut self, metric: &dyn Metric, label_values: &[String], value: f64) {
        self.push(metric, label_values, value);
    }

    fn consume_gauge(&mut self, metric: &dyn Metric, label_values: &[String], value: f64) {
        self.push(metric, label_values, value);
    }

    fn consume_histogram(
        &mut self,
        metric: &dyn Metric,
        label_values: &[String],
        data: &HistogramData,
    ) {
        self.push(metric, label_values, data.count as f64);
    }

    fn consume_summary(
        &mut self,
        metric: &dyn Metric,
        label_values: &[String],
        data: &SummaryData,
    ) {
        self.push(metric, label_values, data.count as f64);
    }
}

fn scrape(registry: &MetricRegistry) -> Vec<Sample> {
    let mut collector = Collector::default();
    registry.for_each_metric_data(&mut collector);
    collector.samples
}

fn open_fds_gauge(value: f64) -> Gauge {
    GaugeBuilder::new("process_open_fds", "Number of open file descriptors.")
        .with_value_supplier(move || value)
        .build()
        .expect("gauge should build")
}

#[test]
fn end_to_end_gauge_scrape() {
    let registry = MetricRegistry::new();
    registry
        .get_or_register(open_fds_gauge(42.0))
        .expect("registration");

    assert_eq!(
        scrape(&registry),
        vec![Sample {
            name: "process_open_fds".to_string(),
            metric_type: MetricType::Gauge,
            label_values: vec![],
            value: 42.0,
        }]
    );
}

#[test]
fn idempotent_registration_keeps_one_entry() {
    let registry = MetricRegistry::new();
    let first = registry.get_or_register(open_fds_gauge(1.0)).expect("first");
    let second = registry.get_or_register(open_fds_gauge(1.0)).expect("second");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
}

#[test]
fn conflicting_registration_keeps_the_gauge() {
    let registry = MetricRegistry::new();
    registry.get_or_register(open_fds_gauge(3.0)).expect("gauge");

    let counter = CounterBuilder::new("process_open_fds", "Number of open file descriptors.")
        .build()
        .expect("counter should build");
    let err = registry.get_or_register(counter).err();

    assert!(matches!(err, Some(MetricsError::MetricNameConflict { .. })));
    assert_eq!(err.map(|err| err.error_code()), Some("MetricNameConflict"));
    assert_eq!(scrape(&registry).len(), 1);
    assert_eq!(scrape(&registry)[0].metric_type, MetricType::Gauge);
}

#[test]
fn label_arity_is_enforced_at_child_access() {
    let counter = CounterBuilder::new("ops_total", "Operations.")
        .with_labels(&["a", "b"])
        .build()
        .expect("counter should build");

    for values in [&["x"][..], &["x", "y", "z"][..]] {
        assert!(matches!(
            counter.labels(values),
            Err(MetricsError::InvalidLabelCount { expected: 2, .. })
        ));
    }
    assert!(counter.labels(&["x", "y"]).is_ok());
}

#[test]
fn every_scrape_calls_the_supplier_again() {
    let ticks = Arc::new(AtomicU64::new(0));
    let source = Arc::clone(&ticks);
    let registry = MetricRegistry::new();
    registry
        .get_or_register(
            GaugeBuilder::new("ticks", "Monotonic ticks.")
                .with_value_supplier(move || source.fetch_add(1, Ordering::SeqCst) as f64)
                .build()
                .expect("gauge should build"),
        )
        .expect("registration");

    let observed: Vec<f64> = (0..3).map(|_| scrape(&registry)[0].value).collect();
    assert_eq!(observed, vec![0.0, 1.0, 2.0]);
}

#[test]
fn untouched_labeled_metrics_emit_nothing() {
    let registry = MetricRegistry::new();
    registry
        .get_or_register(
            CounterBuilder::new("errors_total", "Errors.")
                .with_labels(&["kind"])
                .build()
                .expect("counter"),
        )
        .expect("registration");
    registry
        .get_or_register(
            HistogramBuilder::new("latency_seconds", "Latency.")
                .with_labels(&["route"])
                .build()
                .expect("histogram"),
        )
        .expect("registration");

    assert!(scrape(&registry).is_empty());
}

#[test]
fn concurrent_registration_resolves_to_one_instance() {
    const THREADS: usize = 16;
    let registry = MetricRegistry::new();
    let barrier = Barrier::new(THREADS);
    let (registry_ref, barrier_ref) = (&registry, &barrier);

    let winners: Vec<Arc<Gauge>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(move || {
                    let gauge = open_fds_gauge(7.0);
                    barrier_ref.wait();
                    registry_ref.get_or_register(gauge).expect("registration")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect()
    });

    assert!(winners.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(registry.len(), 1);
}

#[test]
fn scraping_while_children_are_created() {
    let registry = MetricRegistry::new();
    let counter = registry
        .get_or_register(
            CounterBuilder::new("hits_total", "Hits.")
                .with_labels(&["worker"])
                .build()
                .expect("counter"),
        )
        .expect("registration");

    thread::scope(|scope| {
        for worker in 0..4 {
            let counter = Arc::clone(&counter);
            scope.spawn(move || {
                let label = worker.to_string();
                for _ in 0..500 {
                    counter.inc(&[label.as_str()]).expect("inc");
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..50 {
                assert!(scrape(&registry).len() <= 4);
            }
        });
    });

    let samples = scrape(&registry);
    assert_eq!(samples.len(), 4);
    assert!(samples.iter().all(|sample| sample.value == 500.0));
}

#[test]
fn broken_supplier_does_not_block_other_metrics() {
    let registry = MetricRegistry::new();
    registry
        .get_or_register(
            GaugeBuilder::new("broken", "Always fails.")
                .with_value_supplier(|| panic!("source unavailable"))
                .build()
                .expect("gauge"),
        )
        .expect("registration");
    registry.get_or_register(open_fds_gauge(5.0)).expect("registration");

    let values: Vec<_> = scrape(&registry)
        .into_iter()
        .map(|sample| (sample.name, sample.value))
        .collect();
    assert_eq!(
        values,
        vec![("broken".to_string(), 0.0), ("process_open_fds".to_string(), 5.0)]
    );
}

#[test]
fn configuration_errors_surface_at_build_time() {
    let errors = [
        GaugeBuilder::new("0bad", "Help.").build().err(),
        GaugeBuilder::new("ok", "").build().err(),
        GaugeBuilder::new("ok", "Help.").with_labels(&["a", "a"]).build().err(),
    ];

    for err in errors {
        assert!(err.is_some_and(|err| err.is_configuration()));
    }
}

#[test]
fn text_exposition_of_a_mixed_registry() {
    let registry = MetricRegistry::new();
    registry.get_or_register(open_fds_gauge(42.0)).expect("gauge");

    let requests = registry
        .get_or_register(
            CounterBuilder::new("http_requests_total", "HTTP requests.")
                .with_labels(&["method", "path"])
                .build()
                .expect("counter"),
        )
        .expect("registration");
    requests.inc_by(&["GET", "/a\"b"], 3.0).expect("inc");

    let latency = registry
        .get_or_register(
            HistogramBuilder::new("latency_seconds", "Request latency.")
                .with_buckets(&[0.5, 1.0])
                .build()
                .expect("histogram"),
        )
        .expect("registration");
    latency.observe(&[], 0.25).expect("observe");
    latency.observe(&[], 2.0).expect("observe");

    let sizes = registry
        .get_or_register(
            SummaryBuilder::new("payload_bytes", "Payload size.")
                .with_quantiles(&[0.5])
                .build()
                .expect("summary"),
        )
        .expect("registration");
    sizes.observe(&[], 10.0).expect("observe");

    let expected = "\
# HELP process_open_fds Number of open file descriptors.
# TYPE process_open_fds gauge
process_open_fds 42
# HELP http_requests_total HTTP requests.
# TYPE http_requests_total counter
http_requests_total{method=\"GET\",path=\"/a\\\"b\"} 3
# HELP latency_seconds Request latency.
# TYPE latency_seconds histogram
latency_seconds_bucket{le=\"0.5\"} 1
latency_seconds_bucket{le=\"1\"} 1
latency_seconds_bucket{le=\"+Inf\"} 2
latency_seconds_sum 2.25
latency_seconds_count 2
# HELP payload_bytes Payload size.
# TYPE payload_bytes summary
payload_bytes{quantile=\"0.5\"} 10
payload_bytes_sum 10
payload_bytes_count 1
";

    assert_eq!(TextEncoder::new().render(&registry), expected);
}

#[test]
fn timestamps_are_appended_when_enabled() {
    let registry = MetricRegistry::new();
    registry.get_or_register(open_fds_gauge(1.0)).expect("gauge");

    let rendered = TextEncoder::new().with_timestamps(true).render(&registry);
    let sample = rendered
        .lines()
        .find(|line| line.starts_with("process_open_fds "))
        .expect("sample line");
    let parts: Vec<_> = sample.split(' ').collect();

    assert_eq!(parts.len(), 3);
    assert!(parts[2].parse::<i64>().is_ok_and(|ts| ts > 0));
}
