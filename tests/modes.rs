use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use rand::RngCore;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use weather_exporter::catalog::{perf_temperature_catalog, rainfall_catalog, temperature_catalog};
use weather_exporter::config::{AppConfig, RunMode};
use weather_exporter::metrics::MetricsRegistry;
use weather_exporter::sampler::{spawn_sampler, PerfSampler, Sampler, WeatherSampler};
use weather_exporter::server::create_metrics_router;

/// Perf sampler that holds its cycle open until the test releases it.
struct HeldPerfSampler {
    inner: PerfSampler,
    entered: Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl Sampler for HeldPerfSampler {
    fn name(&self) -> &'static str {
        "held-perf"
    }

    fn sample(&self, rng: &mut dyn RngCore) -> usize {
        if let Some(entered) = self.entered.lock().unwrap().take() {
            let _ = entered.send(());
        }
        let written = self.inner.sample(rng);
        let _ = self.release.lock().unwrap().recv();
        written
    }
}

// Single-threaded runtime: a cycle running on the async worker would starve the scrape.
#[tokio::test]
async fn scrape_completes_while_perf_cycle_runs() {
    let registry = Arc::new(MetricsRegistry::new());
    let pool = registry.register_gauge_pool(2_000).unwrap();
    let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let handle = spawn_sampler(
        HeldPerfSampler {
            inner: PerfSampler::new(perf_temperature_catalog(), pool),
            entered: Mutex::new(Some(entered_tx)),
            release: Mutex::new(release_rx),
        },
        Duration::from_secs(60),
    );

    entered_rx.await.unwrap();
    assert_eq!(handle.cycles(), 0);

    let response = tokio::time::timeout(
        Duration::from_secs(10),
        create_metrics_router(registry.clone())
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap()),
    )
    .await
    .expect("scrape finished while the cycle was still running")
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(handle.cycles(), 0);

    release_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(10), async {
        while handle.cycles() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn perf_mode_with_five_gauges() {
    let config = AppConfig::from_env_map([
        ("RUN_PERF_TEST", "true"),
        ("METRIC_COUNT", "5"),
        ("SCRAPE_INTERVAL", "10"),
    ])
    .unwrap();
    assert_eq!(config.mode, RunMode::Perf);

    let registry = Arc::new(MetricsRegistry::new());
    let pool = registry.register_gauge_pool(config.metric_count).unwrap();
    let handle = spawn_sampler(
        PerfSampler::new(perf_temperature_catalog(), pool),
        config.sample_period(),
    );
    tokio::time::sleep(Duration::from_millis(1)).await;

    let mut names = registry.family_names();
    names.sort();
    assert_eq!(
        names,
        (0..5)
            .map(|i| format!("myapp_temperature_{i}"))
            .collect::<Vec<_>>()
    );

    let text = registry.render().unwrap();
    let series = text.lines().filter(|l| !l.starts_with('#')).count();
    assert_eq!(series, 5 * perf_temperature_catalog().city_count());

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(handle.cycles(), 3);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn normal_mode_ignores_bad_interval() {
    let config = AppConfig::from_env_map([("SCRAPE_INTERVAL", "abc")]).unwrap();
    assert_eq!(config.mode, RunMode::Normal);
    assert_eq!(config.sample_period(), Duration::from_secs(60));

    let registry = Arc::new(MetricsRegistry::new());
    let instruments = registry.register_weather().unwrap();
    let handle = spawn_sampler(
        WeatherSampler::new(temperature_catalog(), rainfall_catalog(), instruments),
        config.sample_period(),
    );
    tokio::time::sleep(Duration::from_millis(1)).await;

    let text = registry.render().unwrap();
    for (location, city, _) in temperature_catalog().iter() {
        let line = format!(r#"myapp_measurements_total{{city="{city}",location="{location}"}} 1"#);
        assert!(text.contains(&line), "missing {line}");
    }
    handle.shutdown().await;
}
