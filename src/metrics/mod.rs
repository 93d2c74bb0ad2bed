// Metrics registry module
// This file owns the prometheus registry, creates the weather and
// perf-test instruments at startup and renders the text exposition
//
// Numan Thabit 2025 Nov

pub mod summary;

use crate::errors::WeatherError;
use prometheus::{
    linear_buckets, CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use tracing::debug;

pub use summary::SummaryVec;

/// Label names shared by every instrument.
pub const LABELS: [&str; 2] = ["city", "location"];

/// Prefix of the perf-mode gauge family names.
pub const GAUGE_POOL_PREFIX: &str = "myapp_temperature_";

/// Explicit registry handed to the sampler and the HTTP handler.
pub struct MetricsRegistry {
    registry: Registry,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Create the normal-mode temperature and rainfall instruments.
    pub fn register_weather(&self) -> Result<WeatherInstruments, WeatherError> {
        let measurements = CounterVec::new(
            Opts::new("myapp_measurements_total", "temperature measurements taken per city"),
            &LABELS,
        )?;
        let temperature = GaugeVec::new(
            Opts::new("myapp_temperature", "last sampled temperature per city"),
            &LABELS,
        )?;
        let rainfall = GaugeVec::new(
            Opts::new("myapp_rainfall", "last sampled rainfall per city"),
            &LABELS,
        )?;
        let temperature_summary = SummaryVec::new(
            "myapp_temperature_summary",
            "temperature distribution per city",
            &LABELS,
        )?;
        let rainfall_summary = SummaryVec::new(
            "myapp_rainfall_summary",
            "rainfall distribution per city",
            &LABELS,
        )?;
        let temperature_histogram = HistogramVec::new(
            HistogramOpts::new("myapp_temperature_histogram", "temperature buckets per city")
                .buckets(linear_buckets(0.0, 10.0, 10)?),
            &LABELS,
        )?;
        let rainfall_histogram = HistogramVec::new(
            HistogramOpts::new("myapp_rainfall_histogram", "rainfall buckets per city")
                .buckets(linear_buckets(0.0, 0.05, 10)?),
            &LABELS,
        )?;

        self.registry.register(Box::new(measurements.clone()))?;
        self.registry.register(Box::new(temperature.clone()))?;
        self.registry.register(Box::new(rainfall.clone()))?;
        self.registry.register(Box::new(temperature_summary.clone()))?;
        self.registry.register(Box::new(rainfall_summary.clone()))?;
        self.registry.register(Box::new(temperature_histogram.clone()))?;
        self.registry.register(Box::new(rainfall_histogram.clone()))?;
        debug!("weather instruments registered");

        Ok(WeatherInstruments {
            measurements,
            temperature,
            temperature_summary,
            temperature_histogram,
            rainfall,
            rainfall_summary,
            rainfall_histogram,
        })
    }

    /// Create `count` identical gauge families named `myapp_temperature_<i>`.
    pub fn register_gauge_pool(&self, count: usize) -> Result<GaugePool, WeatherError> {
        let mut gauges = Vec::with_capacity(count);
        for i in 0..count {
            let name = format!("{GAUGE_POOL_PREFIX}{i}");
            let gauge = GaugeVec::new(Opts::new(name, "perf test temperature gauge"), &LABELS)?;
            self.registry.register(Box::new(gauge.clone()))?;
            gauges.push(gauge);
        }
        debug!(count = count, "gauge pool registered");
        Ok(GaugePool { gauges })
    }

    /// Render every family holding at least one series in text exposition format.
    pub fn render(&self) -> Result<String, WeatherError> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Content type matching `render`'s output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Names of the families that currently hold series.
    pub fn family_names(&self) -> Vec<String> {
        self.registry
            .gather()
            .iter()
            .map(|mf| mf.get_name().to_string())
            .collect()
    }
}

/// Normal-mode instruments, all labelled by `city` and `location`.
#[derive(Clone)]
pub struct WeatherInstruments {
    pub measurements: CounterVec,
    pub temperature: GaugeVec,
    pub temperature_summary: SummaryVec,
    pub temperature_histogram: HistogramVec,
    pub rainfall: GaugeVec,
    pub rainfall_summary: SummaryVec,
    pub rainfall_histogram: HistogramVec,
}

impl WeatherInstruments {
    /// Count one measurement and record `value` on every temperature instrument.
    pub fn record_temperature(
        &self,
        city: &str,
        location: &str,
        value: f64,
    ) -> Result<(), WeatherError> {
        let labels = [city, location];
        self.measurements.get_metric_with_label_values(&labels)?.inc();
        self.temperature.get_metric_with_label_values(&labels)?.set(value);
        self.temperature_summary.observe(&labels, value)?;
        self.temperature_histogram
            .get_metric_with_label_values(&labels)?
            .observe(value);
        Ok(())
    }

    pub fn record_rainfall(
        &self,
        city: &str,
        location: &str,
        value: f64,
    ) -> Result<(), WeatherError> {
        let labels = [city, location];
        self.rainfall.get_metric_with_label_values(&labels)?.set(value);
        self.rainfall_summary.observe(&labels, value)?;
        self.rainfall_histogram
            .get_metric_with_label_values(&labels)?
            .observe(value);
        Ok(())
    }
}

/// Perf-mode gauges; index `i` is the family `myapp_temperature_<i>`.
#[derive(Clone)]
pub struct GaugePool {
    gauges: Vec<GaugeVec>,
}

// Never empty in practice: the pool size is a validated positive count.
#[allow(clippy::len_without_is_empty)]
impl GaugePool {
    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn get(&self, index: usize) -> Option<&GaugeVec> {
        self.gauges.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GaugeVec> {
        self.gauges.iter()
    }
}
