//! HorizontalPodAutoscaler Prometheus exporter library.

pub mod cli;
pub mod config;
pub mod hpa;
pub mod k8s;
pub mod lifecycle;
pub mod metrics;
pub mod observability;

pub use config::schema::ExporterConfig;
pub use lifecycle::Shutdown;
pub use metrics::MetricsRegistry;
