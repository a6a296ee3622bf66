//! Watch-to-metric projection engine.
//!
//! # Data Flow
//! ```text
//! WatchEvent (router.rs)
//!     → Add / Update / Delete, serialized on one worker
//!     → projection.rs (apply or retract a snapshot)
//!         → snapshot.rs (fields and label values)
//!         → legacy.rs (annotation arrays, via quantity.rs)
//!     → metrics::HpaMetrics
//! ```
//!
//! # Design Decisions
//! - Snapshots are plain values, decoupled from the API types
//! - Decode failures never leave this module; they are logged and counted
//! - Metric source kinds are a closed enum matched exhaustively

pub mod legacy;
pub mod projection;
pub mod quantity;
pub mod router;
pub mod snapshot;

pub use projection::{Action, Projector};
pub use router::{EventRouter, WatchEvent};
pub use snapshot::{AutoscalerSnapshot, ResourceKey};
