// Labelled summary collector
// The prometheus crate ships counters, gauges and histograms but no
// summary type; this collector fills the gap with quantiles computed over
// a sliding window of recent observations
//
// Numan Thabit 2025 Nov

use prometheus::core::{Collector, Desc};
use prometheus::proto::{LabelPair, Metric, MetricFamily, MetricType, Quantile, Summary};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Quantile -> allowed rank error, as configured on the summaries.
pub const DEFAULT_OBJECTIVES: [(f64, f64); 3] = [(0.5, 0.05), (0.9, 0.01), (0.99, 0.001)];

/// Observations older than this stop contributing to quantiles.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(600);

#[derive(Default)]
struct SeriesState {
    count: u64,
    sum: f64,
    window: VecDeque<(Instant, f64)>,
}

impl SeriesState {
    fn observe(&mut self, value: f64, now: Instant, max_age: Duration) {
        self.count += 1;
        self.sum += value;
        self.window.push_back((now, value));
        self.expire(now, max_age);
    }

    fn expire(&mut self, now: Instant, max_age: Duration) {
        while let Some((at, _)) = self.window.front() {
            if now.duration_since(*at) > max_age {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    // Exact quantiles over the window satisfy any configured rank error.
    fn quantiles(&self, objectives: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut sorted: Vec<f64> = self.window.iter().map(|(_, v)| *v).collect();
        sorted.sort_by(f64::total_cmp);
        objectives
            .iter()
            .map(|(q, _)| {
                if sorted.is_empty() {
                    return (*q, f64::NAN);
                }
                let rank = (q * sorted.len() as f64).ceil() as usize;
                let idx = rank.saturating_sub(1).min(sorted.len() - 1);
                (*q, sorted[idx])
            })
            .collect()
    }
}

/// A summary partitioned by label values, registered like any other collector.
#[derive(Clone)]
pub struct SummaryVec {
    desc: Arc<Desc>,
    label_names: Arc<Vec<String>>,
    objectives: Arc<Vec<(f64, f64)>>,
    max_age: Duration,
    series: Arc<Mutex<BTreeMap<Vec<String>, SeriesState>>>,
}

impl SummaryVec {
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> prometheus::Result<Self> {
        Self::with_objectives(name, help, label_names, &DEFAULT_OBJECTIVES, DEFAULT_MAX_AGE)
    }

    pub fn with_objectives(
        name: &str,
        help: &str,
        label_names: &[&str],
        objectives: &[(f64, f64)],
        max_age: Duration,
    ) -> prometheus::Result<Self> {
        let label_names: Vec<String> = label_names.iter().map(|l| l.to_string()).collect();
        let desc = Desc::new(
            name.to_string(),
            help.to_string(),
            label_names.clone(),
            HashMap::new(),
        )?;
        let mut objectives = objectives.to_vec();
        objectives.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self {
            desc: Arc::new(desc),
            label_names: Arc::new(label_names),
            objectives: Arc::new(objectives),
            max_age,
            series: Arc::new(Mutex::new(BTreeMap::new())),
        })
    }

    /// Record one observation for the series identified by `label_values`.
    pub fn observe(&self, label_values: &[&str], value: f64) -> prometheus::Result<()> {
        if label_values.len() != self.label_names.len() {
            return Err(prometheus::Error::InconsistentCardinality {
                expect: self.label_names.len(),
                got: label_values.len(),
            });
        }
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        let mut series = self.series.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        series
            .entry(key)
            .or_default()
            .observe(value, Instant::now(), self.max_age);
        Ok(())
    }

    /// `(count, sum)` for one series, if it has been observed.
    pub fn sample_totals(&self, label_values: &[&str]) -> Option<(u64, f64)> {
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        let series = self.series.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        series.get(&key).map(|s| (s.count, s.sum))
    }

    fn build_metric(&self, label_values: &[String], state: &SeriesState) -> Metric {
        let mut summary = Summary::default();
        summary.set_sample_count(state.count);
        summary.set_sample_sum(state.sum);
        for (q, v) in state.quantiles(&self.objectives) {
            let mut quantile = Quantile::default();
            quantile.set_quantile(q);
            quantile.set_value(v);
            summary.mut_quantile().push(quantile);
        }

        let mut metric = Metric::default();
        for (name, value) in self.label_names.iter().zip(label_values) {
            let mut pair = LabelPair::default();
            pair.set_name(name.clone());
            pair.set_value(value.clone());
            metric.mut_label().push(pair);
        }
        metric.set_summary(summary);
        metric
    }
}

impl Collector for SummaryVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.desc]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let now = Instant::now();
        let mut series = self.series.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if series.is_empty() {
            return Vec::new();
        }

        let mut family = MetricFamily::default();
        family.set_name(self.desc.fq_name.clone());
        family.set_help(self.desc.help.clone());
        family.set_field_type(MetricType::SUMMARY);
        for (labels, state) in series.iter_mut() {
            state.expire(now, self.max_age);
            family.mut_metric().push(self.build_metric(labels, state));
        }
        vec![family]
    }
}
