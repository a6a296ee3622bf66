//! Metrics subsystem.
//!
//! # Data Flow
//! ```text
//! projection (hpa::projection)
//!     → store.rs (six autoscaler gauge families)
//!     → registry.rs (prometheus::Registry owned by MetricsRegistry)
//!     → server.rs (GET /metrics, text exposition)
//!
//! router / watch source
//!     → exporter.rs (event, error and decode counters)
//! ```
//!
//! # Design Decisions
//! - One explicitly constructed registry, shared by `Arc`; no global state
//! - Series are last-write-wins; removal is by partial label match
//! - Rendering is a read-only snapshot and runs off the async workers

pub mod error;
pub mod exporter;
pub mod registry;
pub mod server;
pub mod store;

pub use error::MetricsError;
pub use registry::{GaugeFamily, MetricsRegistry};
pub use store::HpaMetrics;
