//! Loader telemetry for observability.
//!
//! Lock-free atomic counters updated by the loader's request path and its
//! workers, read through point-in-time snapshots.
//!
//! ```text
//! TileLoader / workers ─────► LoaderMetrics ─────► LoaderSnapshot ─────► CLI, logs
//!                            (atomic counters)    (point-in-time copy)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use terrastream::telemetry::LoaderMetrics;
//!
//! let metrics = LoaderMetrics::new();
//! metrics.tile_requested();
//! metrics.tile_completed();
//!
//! let snapshot = metrics.snapshot();
//! println!("in flight: {}", snapshot.in_flight());
//! ```

mod metrics;
mod snapshot;

pub use metrics::LoaderMetrics;
pub use snapshot::LoaderSnapshot;
