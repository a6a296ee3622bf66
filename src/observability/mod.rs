//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!
//! Consumers:
//!     → stdout (text for humans, JSON for log aggregation)
//! ```
//!
//! Self-metrics live with the exported autoscaler series in
//! [`crate::metrics`], so a single scrape returns both.

pub mod logging;

pub use logging::init_logging;
