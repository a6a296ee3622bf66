//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ExporterConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(name = "hpa-exporter")]
#[command(version, about = "Export HorizontalPodAutoscaler spec and status as Prometheus metrics", long_about = None)]
pub struct Cli {
    /// Optional TOML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Absolute path to the kubeconfig file (in-cluster config when omitted)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Metrics prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Address the metrics endpoint listens on
    #[arg(long)]
    pub listen_address: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Overwrite the fields given on the command line.
    pub fn apply_overrides(&self, config: &mut ExporterConfig) {
        if let Some(path) = &self.kubeconfig {
            config.kubeconfig = Some(path.clone());
        }
        if let Some(prefix) = &self.prefix {
            config.metrics_prefix = prefix.clone();
        }
        if let Some(address) = &self.listen_address {
            config.listen_address = address.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}
