use std::io;

use thiserror::Error;

/// Errors raised while setting up or serving metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A collector could not be created or registered.
    #[error("failed to register metric {name}: {source}")]
    Registration {
        name: String,
        #[source]
        source: prometheus::Error,
    },

    /// Gathered families could not be rendered.
    #[error("failed to encode metrics: {0}")]
    Encode(#[source] prometheus::Error),

    #[error("failed to bind metrics listener on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("metrics server error: {0}")]
    Serve(#[source] io::Error),
}
