//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files, and
//! every field has a default so an empty file is a valid configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Root configuration for the exporter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Path to a kubeconfig file. In-cluster credentials are used when unset.
    pub kubeconfig: Option<PathBuf>,

    /// Prefix prepended to every autoscaler metric name.
    pub metrics_prefix: String,

    /// Metrics endpoint bind address (e.g., "0.0.0.0:8080" or ":8080").
    pub listen_address: String,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Capacity of the queue between the watch and the event router.
    pub event_queue_capacity: usize,

    /// How long shutdown waits for queued events to drain.
    pub shutdown_timeout_secs: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            metrics_prefix: "kube_".to_string(),
            listen_address: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            event_queue_capacity: 1024,
            shutdown_timeout_secs: 10,
        }
    }
}

impl ExporterConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Bind address with a bare `:port` expanded to all interfaces.
    pub fn bind_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}
