//! World streamer configuration.

use serde::{Deserialize, Serialize};

use crate::coord::DEFAULT_TILE_SIZE;

/// Default window radius around the camera tile.
pub const DEFAULT_RADIUS: u32 = 1;

/// Default world size of one origin-zoom tile.
pub const DEFAULT_TILE_WORLD_SIZE: f64 = 100.0;

/// Configuration for [`super::WorldStreamer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamerConfig {
    /// Tiles kept around the camera tile in each direction
    pub radius: u32,
    /// Tile edge in pixels, used for projection
    pub tile_size: u32,
    /// World units spanned by one tile at the origin zoom
    pub tile_world_size: f64,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            tile_size: DEFAULT_TILE_SIZE,
            tile_world_size: DEFAULT_TILE_WORLD_SIZE,
        }
    }
}

impl StreamerConfig {
    /// Set the window radius.
    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    /// Set the projection tile size.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the world size of an origin-zoom tile.
    pub fn with_tile_world_size(mut self, size: f64) -> Self {
        self.tile_world_size = size;
        self
    }

    /// Number of tiles in a full window.
    pub fn window_len(&self) -> usize {
        let side = 2 * self.radius as usize + 1;
        side * side
    }
}
