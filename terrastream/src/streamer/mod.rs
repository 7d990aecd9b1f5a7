//! World streaming: picks the tile window, feeds the loader, and turns
//! finished payloads into render resources.
//!
//! ```text
//! tick(camera) ──► window (camera ± radius) ──► TileLoader::request
//!              ──► TileLoader::drain_ready ──► RenderSink
//!                                              texture → mesh → transform
//!                                                        │
//!                                                        ▼
//!                                                  ResourceStack
//! ```

mod config;
mod sink;
mod transform;
mod world;

pub use config::{StreamerConfig, DEFAULT_RADIUS, DEFAULT_TILE_WORLD_SIZE};
pub use sink::{
    HeadlessLedger, HeadlessResource, HeadlessSink, RenderError, RenderSink, ResourceKind,
};
pub use transform::{WorldFrame, WorldTransform};
pub use world::{StreamerState, StreamerStats, TickSummary, WorldStreamer};
