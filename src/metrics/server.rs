//! HTTP endpoint serving the registry.
//!
//! # Routes
//! - `GET /metrics`: text exposition of every registered family
//! - `GET /-/healthy`, `GET /-/ready`: always `200 OK` once the process runs
//! - `GET /`: landing page

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::metrics::error::MetricsError;
use crate::metrics::registry::MetricsRegistry;

const LANDING_PAGE: &str = r#"<html>
<head><title>HPA Exporter</title></head>
<body>
<h1>HPA Exporter</h1>
<p>Exports HorizontalPodAutoscaler spec and status as Prometheus metrics.</p>
<ul><li><a href="/metrics">Metrics</a></li></ul>
</body>
</html>
"#;

/// Build the metrics router.
pub fn router(metrics: Arc<MetricsRegistry>) -> Router {
    Router::new()
        .route("/", get(landing_handler))
        .route("/metrics", get(metrics_handler))
        .route("/-/healthy", get(ok_handler))
        .route("/-/ready", get(ok_handler))
        .with_state(metrics)
        .layer(TraceLayer::new_for_http())
}

/// Bind the metrics listener.
pub async fn bind(address: &str) -> Result<TcpListener, MetricsError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| MetricsError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Serve until the shutdown signal fires.
pub async fn serve(
    listener: TcpListener,
    metrics: Arc<MetricsRegistry>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), MetricsError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Metrics server listening");
    }

    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
        .map_err(MetricsError::Serve)?;

    tracing::info!("Metrics server stopped");
    Ok(())
}

async fn metrics_handler(State(metrics): State<Arc<MetricsRegistry>>) -> Response {
    let content_type = metrics.content_type();
    match tokio::task::spawn_blocking(move || metrics.render()).await {
        Ok(Ok(body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to encode metrics: {e}"))
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Metrics gathering task panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to gather metrics").into_response()
        }
    }
}

async fn ok_handler() -> &'static str {
    "OK"
}

async fn landing_handler() -> Html<&'static str> {
    Html(LANDING_PAGE)
}
