//! TerraStream - Streaming terrain core for interactive 3D viewers
//!
//! This library turns a geographic location into a zoomable ground surface
//! built from remote elevation samples and imagery, without ever blocking
//! the render loop.
//!
//! # Architecture
//!
//! ```text
//! WorldStreamer::tick(camera)
//!     │  window of TileKeys
//!     ▼
//! TileLoader ──► worker pool ──► TileDataProvider (elevation, imagery)
//!     │                    └──► MeshBuilder (projection, IDW smoothing)
//!     │  drain_ready: each MeshPayload exactly once
//!     ▼
//! RenderSink ──► ResourceStack (reverse-order teardown)
//! ```
//!
//! - [`coord`]: tile pyramid projection and zoom alignment
//! - [`provider`]: elevation and imagery sources
//! - [`mesh`]: plain-data mesh payloads
//! - [`loader`]: deduplicating concurrent tile loader
//! - [`streamer`]: per-frame controller and render seam
//! - [`resource`]: LIFO render resource ownership

pub mod config;
pub mod coord;
pub mod loader;
pub mod logging;
pub mod mesh;
pub mod provider;
pub mod resource;
pub mod streamer;
pub mod telemetry;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
