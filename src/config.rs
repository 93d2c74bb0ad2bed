// Configuration management module
// This file loads run-mode and perf-test settings from environment
// variables; unparsable numbers fall back to defaults with a warning
//
// Numan Thabit 2025 Nov

use crate::errors::ConfigWarning;
use crate::sampler::NORMAL_PERIOD;
use anyhow::Result;
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_SCRAPE_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_METRIC_COUNT: u64 = 10_000;
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:2112";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Temperature and rainfall for every catalogued city.
    Normal,
    /// Gauge pool fan-out for cardinality testing.
    Perf,
}

/// Raw environment values as read by the `config` crate (keys lowercased).
#[derive(Debug, Default, Deserialize)]
struct RawEnv {
    run_perf_test: Option<String>,
    scrape_interval: Option<String>,
    metric_count: Option<String>,
    metrics_addr: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: RunMode,
    /// Perf-mode sampling period
    pub scrape_interval: Duration,
    /// Perf-mode gauge pool size
    pub metric_count: usize,
    pub listen_addr: SocketAddr,
    /// Settings that were present but rejected
    pub warnings: Vec<ConfigWarning>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::default())
    }

    /// Build from an explicit variable map instead of the process environment.
    pub fn from_env_map<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_source(config::Environment::default().source(Some(map)))
    }

    fn from_source(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder().add_source(env).build()?;
        let raw: RawEnv = cfg.try_deserialize()?;
        let config = Self::from_raw(raw);
        for warning in &config.warnings {
            warn!(warning = %warning, "ignoring invalid configuration value");
        }
        Ok(config)
    }

    fn from_raw(raw: RawEnv) -> Self {
        let mut warnings = Vec::new();

        let mode = if raw.run_perf_test.as_deref() == Some("true") {
            RunMode::Perf
        } else {
            RunMode::Normal
        };

        let mut scrape_interval = DEFAULT_SCRAPE_INTERVAL_SECS;
        let mut metric_count = DEFAULT_METRIC_COUNT;
        if mode == RunMode::Perf {
            scrape_interval = positive_or_default(
                "SCRAPE_INTERVAL",
                present(&raw.scrape_interval),
                DEFAULT_SCRAPE_INTERVAL_SECS,
                &mut warnings,
            );
            metric_count = positive_or_default(
                "METRIC_COUNT",
                present(&raw.metric_count),
                DEFAULT_METRIC_COUNT,
                &mut warnings,
            );
        }

        let default_addr: SocketAddr = SocketAddr::from(([0, 0, 0, 0], 2112));
        let listen_addr = match present(&raw.metrics_addr) {
            None => default_addr,
            Some(value) => SocketAddr::from_str(value).unwrap_or_else(|_| {
                warnings.push(ConfigWarning::InvalidAddress {
                    var: "METRICS_ADDR",
                    value: value.to_string(),
                    default: DEFAULT_LISTEN_ADDR.to_string(),
                });
                default_addr
            }),
        };

        Self {
            mode,
            scrape_interval: Duration::from_secs(scrape_interval),
            metric_count: metric_count as usize,
            listen_addr,
            warnings,
        }
    }

    /// Period of the sampler selected by `mode`.
    pub fn sample_period(&self) -> Duration {
        match self.mode {
            RunMode::Normal => NORMAL_PERIOD,
            RunMode::Perf => self.scrape_interval,
        }
    }
}

// Empty variables count as unset; values are otherwise taken verbatim.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn positive_or_default(
    var: &'static str,
    value: Option<&str>,
    default: u64,
    warnings: &mut Vec<ConfigWarning>,
) -> u64 {
    let Some(value) = value else {
        return default;
    };
    match value.parse::<u64>() {
        Ok(n) if n > 0 => n,
        _ => {
            warnings.push(ConfigWarning::InvalidNumber {
                var,
                value: value.to_string(),
                default,
            });
            default
        }
    }
}
