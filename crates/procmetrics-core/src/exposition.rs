//! Prometheus text exposition (format version 0.0.4).

use procmetrics_common::time;

use crate::{
    metric::{HistogramData, Metric, MetricDataConsumer, SummaryData},
    registry::MetricRegistry,
};

pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Clone, Copy, Default)]
pub struct TextEncoder {
    timestamps: bool,
}

impl TextEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the scrape time, in unix milliseconds, to every sample.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    pub fn render(&self, registry: &MetricRegistry) -> String {
        let mut writer = TextWriter {
            output: String::new(),
            timestamp: self.timestamps.then(|| time::unix_millis(&time::now())),
        };

        for metric in registry.metrics() {
            writer.write_header(metric.as_ref());
            metric.for_each_metric_data(&mut writer);
        }

        writer.output
    }
}

struct TextWriter {
    output: String,
    timestamp: Option<i64>,
}

impl TextWriter {
    fn write_header(&mut self, metric: &dyn Metric) {
        self.output.push_str("# HELP ");
        self.output.push_str(metric.name());
        self.output.push(' ');
        self.output.push_str(&escape_help(metric.help()));
        self.output.push('\n');

        self.output.push_str("# TYPE ");
        self.output.push_str(metric.name());
        self.output.push(' ');
        self.output.push_str(metric.metric_type().as_prometheus_type());
        self.output.push('\n');
    }

    fn write_sample(
        &mut self,
        name: &str,
        suffix: &str,
        metric: &dyn Metric,
        label_values: &[String],
        extra_label: Option<(&str, f64)>,
        value: f64,
    ) {
        self.output.push_str(name);
        self.output.push_str(suffix);

        let mut labels = metric
            .label_names()
            .iter()
            .map(String::as_str)
            .zip(label_values.iter().map(|value| escape_label_value(value)))
            .collect::<Vec<_>>();
        if let Some((label, bound)) = extra_label {
            labels.push((label, format_value(bound)));
        }

        if !labels.is_empty() {
            self.output.push('{');
            for (index, (key, value)) in labels.iter().enumerate() {
                if index > 0 {
                    self.output.push(',');
                }
                self.output.push_str(key);
                self.output.push_str("=\"");
                self.output.push_str(value);
                self.output.push('"');
            }
            self.output.push('}');
        }

        self.output.push(' ');
        self.output.push_str(&format_value(value));

        if let Some(ts) = self.timestamp {
            self.output.push(' ');
            self.output.push_str(&ts.to_string());
        }

        self.output.push('\n');
    }
}

impl MetricDataConsumer for TextWriter {
    fn consume_counter(&mut self, metric: &dyn Metric, label_values: &[String], value: f64) {
        self.write_sample(metric.name(), "", metric, label_values, None, value);
    }

    fn consume_gauge(&mut self, metric: &dyn Metric, label_values: &[String], value: f64) {
        self.write_sample(metric.name(), "", metric, label_values, None, value);
    }

    fn consume_histogram(
        &mut self,
        metric: &dyn Metric,
        label_values: &[String],
        data: &HistogramData,
    ) {
        let name = metric.name();
        for (bound, cumulative) in &data.buckets {
            self.write_sample(
                name,
                "_bucket",
                metric,
                label_values,
                Some(("le", *bound)),
                *cumulative as f64,
            );
        }
        self.write_sample(name, "_sum", metric, label_values, None, data.sum);
        self.write_sample(name, "_count", metric, label_values, None, data.count as f64);
    }

    fn consume_summary(
        &mut self,
        metric: &dyn Metric,
        label_values: &[String],
        data: &SummaryData,
    ) {
        let name = metric.name();
        for (quantile, value) in &data.quantiles {
            self.write_sample(
                name,
                "",
                metric,
                label_values,
                Some(("quantile", *quantile)),
                *value,
            );
        }
        self.write_sample(name, "_sum", metric, label_values, None, data.sum);
        self.write_sample(name, "_count", metric, label_values, None, data.count as f64);
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn escape_help(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_use_exposition_spelling() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(-0.25), "-0.25");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
    }

    #[test]
    fn help_and_label_values_are_escaped() {
        assert_eq!(escape_help("a\\b\nc \"q\""), "a\\\\b\\nc \"q\"");
        assert_eq!(escape_label_value("say \"hi\"\n\\"), "say \\\"hi\\\"\\n\\\\");
    }
}
