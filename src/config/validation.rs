//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Validation is a pure function
//! `ExporterConfig → Result<(), Vec<ValidationError>>` and reports every
//! problem at once rather than stopping at the first.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ExporterConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single invalid field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every field of the configuration.
pub fn validate_config(config: &ExporterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_valid_prefix(&config.metrics_prefix) {
        errors.push(ValidationError {
            field: "metrics_prefix",
            message: format!(
                "{:?} is not a valid metric name prefix ([a-zA-Z_:][a-zA-Z0-9_:]*)",
                config.metrics_prefix
            ),
        });
    }

    if config.bind_address().parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listen_address",
            message: format!("{:?} is not a socket address", config.listen_address),
        });
    }

    if !LOG_LEVELS.contains(&config.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError {
            field: "log_level",
            message: format!(
                "{:?} is not one of {}",
                config.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.event_queue_capacity == 0 {
        errors.push(ValidationError {
            field: "event_queue_capacity",
            message: "must be greater than zero".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        None => true,
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_' || first == ':')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
    }
}
