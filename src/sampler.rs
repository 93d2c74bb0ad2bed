// Sampler loops
// Background tasks that periodically draw synthetic weather values from
// the location catalog and push them into the registered instruments
//
// Numan Thabit 2025 Nov

use crate::catalog::{sample_rainfall, sample_temperature, Catalog, TempInfo};
use crate::metrics::{GaugePool, WeatherInstruments};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Period of the normal-mode sampler.
pub const NORMAL_PERIOD: Duration = Duration::from_secs(60);

/// One sampling cycle over a catalog.
pub trait Sampler: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Run one cycle and return the number of series written.
    fn sample(&self, rng: &mut dyn RngCore) -> usize;
}

/// Normal mode: temperature and rainfall for every catalogued city.
pub struct WeatherSampler {
    temperatures: &'static Catalog<TempInfo>,
    rainfall: &'static Catalog<f64>,
    instruments: WeatherInstruments,
}

impl WeatherSampler {
    pub fn new(
        temperatures: &'static Catalog<TempInfo>,
        rainfall: &'static Catalog<f64>,
        instruments: WeatherInstruments,
    ) -> Self {
        Self {
            temperatures,
            rainfall,
            instruments,
        }
    }
}

impl Sampler for WeatherSampler {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn sample(&self, rng: &mut dyn RngCore) -> usize {
        let mut written = 0;
        for (location, city, info) in self.temperatures.iter() {
            let temperature = sample_temperature(info, rng);
            match self.instruments.record_temperature(city, location, temperature) {
                Ok(()) => written += 1,
                Err(err) => warn!(city = city, location = location, error = %err, "temperature write failed"),
            }
        }
        for (location, city, avg) in self.rainfall.iter() {
            let rainfall = sample_rainfall(*avg, rng);
            match self.instruments.record_rainfall(city, location, rainfall) {
                Ok(()) => written += 1,
                Err(err) => warn!(city = city, location = location, error = %err, "rainfall write failed"),
            }
        }
        written
    }
}

/// Perf mode: every gauge in the pool gets a fresh value for every city.
pub struct PerfSampler {
    temperatures: &'static Catalog<TempInfo>,
    pool: GaugePool,
}

impl PerfSampler {
    pub fn new(temperatures: &'static Catalog<TempInfo>, pool: GaugePool) -> Self {
        Self { temperatures, pool }
    }
}

impl Sampler for PerfSampler {
    fn name(&self) -> &'static str {
        "perf"
    }

    fn sample(&self, rng: &mut dyn RngCore) -> usize {
        let mut written = 0;
        for gauge in self.pool.iter() {
            for (location, city, info) in self.temperatures.iter() {
                let temperature = sample_temperature(info, rng);
                match gauge.get_metric_with_label_values(&[city, location]) {
                    Ok(series) => {
                        series.set(temperature);
                        written += 1;
                    }
                    Err(err) => {
                        warn!(city = city, location = location, error = %err, "perf gauge write failed")
                    }
                }
            }
        }
        written
    }
}

/// Handle to a running sampler task.
pub struct SamplerHandle {
    shutdown: watch::Sender<bool>,
    cycles: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    /// Completed sampling cycles so far.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    /// Stop the loop and wait for the task to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!(error = %err, "sampler task ended abnormally");
        }
    }
}

/// Spawn `sampler` on the runtime: one cycle immediately, then one per `period`.
pub fn spawn_sampler<S: Sampler>(sampler: S, period: Duration) -> SamplerHandle {
    spawn_sampler_with_rng(sampler, period, StdRng::from_entropy())
}

/// Cycles run on the blocking pool so large perf cycles never stall request handling.
pub fn spawn_sampler_with_rng<S: Sampler>(
    sampler: S,
    period: Duration,
    rng: StdRng,
) -> SamplerHandle {
    let (shutdown, mut stop) = watch::channel(false);
    let cycles = Arc::new(AtomicU64::new(0));
    let counter = cycles.clone();
    let sampler = Arc::new(sampler);
    let rng = Arc::new(Mutex::new(rng));

    let task = tokio::spawn(async move {
        info!(sampler = sampler.name(), period_secs = period.as_secs(), "sampler started");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let started = Instant::now();
                    let job = sampler.clone();
                    let job_rng = rng.clone();
                    let outcome = tokio::task::spawn_blocking(move || {
                        let mut rng = job_rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                        job.sample(&mut *rng)
                    })
                    .await;
                    match outcome {
                        Ok(written) => {
                            let cycle = counter.fetch_add(1, Ordering::Relaxed) + 1;
                            debug!(
                                sampler = sampler.name(),
                                cycle = cycle,
                                written = written,
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "sampling cycle complete"
                            );
                        }
                        Err(err) => warn!(sampler = sampler.name(), error = %err, "sampling cycle failed"),
                    }
                }
                res = stop.changed() => {
                    if res.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
        info!(sampler = sampler.name(), "sampler stopped");
    });

    SamplerHandle {
        shutdown,
        cycles,
        task,
    }
}
