//! HPA Exporter
//!
//! Watches every HorizontalPodAutoscaler in the cluster and exposes its
//! replica bounds, replica counts and per-metric current/target values as
//! Prometheus gauges.
//!
//! # Architecture Overview
//!
//! ```text
//!   kube-apiserver                         ┌───────────────────────────────┐
//!   (autoscaling/v1 watch)                 │          HPA EXPORTER          │
//!   ───────────────────────────────────────┼─▶ k8s::watcher  (source task) │
//!                                          │        │ add/update/delete    │
//!                                          │        ▼                      │
//!                                          │   bounded queue               │
//!                                          │        │                      │
//!                                          │        ▼                      │
//!                                          │   hpa::router  (worker task)  │
//!                                          │        │ apply / retract      │
//!                                          │        ▼                      │
//!   Prometheus scrape                      │   metrics::registry           │
//!   ◀──────────────────────────────────────┼── metrics::server  (/metrics) │
//!                                          └───────────────────────────────┘
//! ```

use std::sync::Arc;

use clap::Parser;

use hpa_exporter::cli::Cli;
use hpa_exporter::config::resolve_config;
use hpa_exporter::k8s::{build_client, HpaWatcher};
use hpa_exporter::lifecycle::{wait_for_signal, Shutdown};
use hpa_exporter::metrics::{server, MetricsRegistry};
use hpa_exporter::observability::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    init_logging(&config.log_level, config.log_format)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hpa-exporter starting");
    tracing::info!(
        listen_address = %config.listen_address,
        metrics_prefix = %config.metrics_prefix,
        kubeconfig = ?config.kubeconfig,
        "Configuration loaded"
    );

    let metrics = Arc::new(MetricsRegistry::new(&config.metrics_prefix)?);
    let shutdown = Shutdown::new();

    let listener = server::bind(&config.bind_address()).await?;
    let mut server_task = tokio::spawn(server::serve(
        listener,
        metrics.clone(),
        shutdown.subscribe(),
    ));

    let client = match build_client(config.kubeconfig.as_deref()).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build Kubernetes client");
            shutdown.trigger();
            let _ = server_task.await;
            return Err(e.into());
        }
    };

    let watcher = HpaWatcher::for_cluster(client, metrics, config.event_queue_capacity).start();

    let server_exit = tokio::select! {
        signal = wait_for_signal() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "Failed to install signal handlers");
            }
            None
        }
        result = &mut server_task => {
            tracing::warn!("Metrics server exited unexpectedly");
            Some(result)
        }
    };

    shutdown.trigger();
    if let Err(e) = watcher.stop(config.shutdown_timeout()).await {
        tracing::warn!(error = %e, "Watch shutdown incomplete");
    }

    let server_result = match server_exit {
        Some(result) => result,
        None => server_task.await,
    };
    match server_result {
        Ok(Err(e)) => tracing::error!(error = %e, "Metrics server failed"),
        Err(e) => tracing::error!(error = %e, "Metrics server task panicked"),
        Ok(Ok(())) => {}
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
