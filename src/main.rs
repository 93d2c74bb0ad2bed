use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use weather_exporter::catalog::{perf_temperature_catalog, rainfall_catalog, temperature_catalog};
use weather_exporter::config::{AppConfig, RunMode};
use weather_exporter::metrics::MetricsRegistry;
use weather_exporter::sampler::{spawn_sampler, PerfSampler, SamplerHandle, WeatherSampler};
use weather_exporter::server;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal weather exporter error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration from environment")?;
    let registry = Arc::new(MetricsRegistry::new());

    let sampler = start_sampler(&config, &registry).context("register instruments")?;

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("bind metrics listener on {}", config.listen_addr))?;
    info!(
        address = %config.listen_addr,
        mode = ?config.mode,
        period_secs = config.sample_period().as_secs(),
        "weather exporter online"
    );

    let served = server::serve(listener, registry, shutdown_signal()).await;
    sampler.shutdown().await;
    served.context("metrics server error")?;
    info!("weather exporter stopped");
    Ok(())
}

fn start_sampler(config: &AppConfig, registry: &MetricsRegistry) -> Result<SamplerHandle> {
    let handle = match config.mode {
        RunMode::Normal => {
            let instruments = registry.register_weather()?;
            spawn_sampler(
                WeatherSampler::new(temperature_catalog(), rainfall_catalog(), instruments),
                config.sample_period(),
            )
        }
        RunMode::Perf => {
            let pool = registry.register_gauge_pool(config.metric_count)?;
            info!(
                gauges = pool.len(),
                cities = perf_temperature_catalog().city_count(),
                "perf test gauge pool created"
            );
            spawn_sampler(
                PerfSampler::new(perf_temperature_catalog(), pool),
                config.sample_period(),
            )
        }
    };
    Ok(handle)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl_c listener error; serving until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, exiting");
}

fn init_tracing() -> Result<()> {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,hyper=warn,tower_http=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
