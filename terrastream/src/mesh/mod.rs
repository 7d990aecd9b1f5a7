//! Tile mesh payloads and the builder that produces them.

mod builder;
mod payload;

pub use builder::{
    idw_height, IdwConfig, MeshBuilder, DEFAULT_ELEVATION_GRID, DEFAULT_RESOLUTION,
    MAX_ELEVATION_GRID, MAX_RESOLUTION,
};
pub use payload::{MeshParts, MeshPayload, Vertex};
