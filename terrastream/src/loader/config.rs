//! Tile loader configuration.

use serde::{Deserialize, Serialize};

use crate::mesh::{IdwConfig, MeshBuilder, DEFAULT_ELEVATION_GRID, DEFAULT_RESOLUTION};

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 4;

/// Configuration for [`super::TileLoader`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Worker threads; also the maximum number of tiles in flight
    pub workers: usize,
    /// Mesh vertices per side
    pub resolution: u32,
    /// Side of the elevation sample neighborhood
    pub elevation_grid: u32,
    /// Height smoothing
    pub idw: IdwConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            resolution: DEFAULT_RESOLUTION,
            elevation_grid: DEFAULT_ELEVATION_GRID,
            idw: IdwConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Set the worker count (at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the mesh resolution.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the elevation neighborhood size.
    pub fn with_elevation_grid(mut self, grid: u32) -> Self {
        self.elevation_grid = grid;
        self
    }

    /// Set the smoothing parameters.
    pub fn with_idw(mut self, idw: IdwConfig) -> Self {
        self.idw = idw;
        self
    }

    pub(crate) fn mesh_builder(&self) -> MeshBuilder {
        MeshBuilder::new(self.resolution, self.elevation_grid, self.idw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.resolution, 32);
        assert_eq!(config.elevation_grid, 5);
    }

    #[test]
    fn test_worker_floor() {
        assert_eq!(LoaderConfig::default().with_workers(0).workers, 1);
    }

    #[test]
    fn test_builder_reflects_config() {
        let builder = LoaderConfig::default()
            .with_resolution(9)
            .with_elevation_grid(3)
            .mesh_builder();
        assert_eq!(builder.resolution(), 9);
        assert_eq!(builder.elevation_grid(), 3);
    }
}
