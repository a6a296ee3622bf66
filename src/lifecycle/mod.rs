//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_signal() returns
//!
//! Shutdown (shutdown.rs):
//!     trigger() → metrics server stops accepting
//!               → watcher stops, queued events drain
//!               → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config, logging, metrics endpoint, then the watch
//! - Ordered shutdown: stop the watch, drain the queue, close the endpoint
//! - Draining has a timeout; the worker is aborted after the deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
