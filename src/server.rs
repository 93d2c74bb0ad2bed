// Exposition HTTP endpoint
// This file serves the registry's current state in Prometheus text
// format on GET /metrics
//
// Numan Thabit 2025 Nov

use crate::metrics::MetricsRegistry;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router as AxumRouter,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::error;

pub const METRICS_PATH: &str = "/metrics";

/// Create the HTTP router exposing `registry`
pub fn create_metrics_router(registry: Arc<MetricsRegistry>) -> AxumRouter {
    AxumRouter::new()
        .route(METRICS_PATH, get(render_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

// Encoding stays off the async workers; a full gauge pool renders several megabytes.
async fn render_metrics(State(registry): State<Arc<MetricsRegistry>>) -> Response {
    let content_type = registry.content_type();
    let rendered = tokio::task::spawn_blocking(move || registry.render()).await;
    match rendered {
        Ok(Ok(body)) => (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response(),
        Ok(Err(err)) => {
            error!(error = %err, "metrics exposition failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
        Err(err) => {
            error!(error = %err, "metrics exposition task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

/// Serve the exposition endpoint on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    registry: Arc<MetricsRegistry>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, create_metrics_router(registry))
        .with_graceful_shutdown(shutdown)
        .await
}
