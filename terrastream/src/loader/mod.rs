//! Concurrent tile loading.
//!
//! The [`TileLoader`] turns tile requests into [`MeshPayload`]s on a bounded
//! worker pool:
//!
//! ```text
//! request(key) ──► LoadTable: Unrequested → Pending ──► worker pool
//!                                                        │ fetch elevation (≤512 per batch)
//!                                                        │ fetch + decode imagery
//!                                                        │ build mesh
//!                                                        ▼
//! drain_ready() ◄── Ready → Consumed ◄──────── Ready | Failed
//! ```
//!
//! Workers only produce plain data; they never touch render resources.
//!
//! [`MeshPayload`]: crate::mesh::MeshPayload

mod config;
mod state;
mod tile_loader;
mod worker;

pub use config::{LoaderConfig, DEFAULT_WORKERS};
pub use state::LoadState;
pub use tile_loader::TileLoader;

use thiserror::Error;

use crate::coord::CoordError;
use crate::provider::ProviderError;

/// Errors that can occur while loading a tile or setting up the loader.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    /// Fetching or decoding tile data failed.
    #[error("Provider failure: {0}")]
    Provider(#[from] ProviderError),

    /// The tile has no valid geographic footprint.
    #[error("Coordinate error: {0}")]
    Coord(#[from] CoordError),

    /// A worker panicked while building the tile.
    #[error("Tile worker panicked")]
    WorkerPanicked,

    /// The worker pool could not be created.
    #[error("Failed to start worker pool: {0}")]
    Pool(String),
}
