//! Heightfield mesh construction.
//!
//! A tile's mesh is a regular `resolution × resolution` vertex grid. Heights
//! come from a coarser `N × N` neighborhood of elevation samples spread over
//! the tile, smoothed onto each vertex by inverse-distance weighting: every
//! sample contributes `1 / max(d, min_distance)^power`, where `d` is measured
//! in tile-local units.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::coord::{extent, tile_center, CoordError, GeoCoordinate, TileKey};
use crate::provider::ElevationSample;

use super::payload::{MeshPayload, Vertex};

/// Default vertices per mesh side.
pub const DEFAULT_RESOLUTION: u32 = 32;

/// Default side length of the elevation neighborhood.
pub const DEFAULT_ELEVATION_GRID: u32 = 5;

/// Largest vertices per mesh side; keeps every vertex addressable by a `u32`
/// index.
pub const MAX_RESOLUTION: u32 = 4096;

/// Largest side length of the elevation neighborhood.
pub const MAX_ELEVATION_GRID: u32 = 64;

/// Inverse-distance weighting parameters.
///
/// Neither value is load-bearing; they only shape how sharp the terrain
/// looks between samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdwConfig {
    /// Distance exponent
    pub power: f64,
    /// Floor applied to distances so a vertex on top of a sample does not
    /// blow up its weight
    pub min_distance: f64,
}

impl Default for IdwConfig {
    fn default() -> Self {
        Self {
            power: 2.0,
            min_distance: 1e-3,
        }
    }
}

/// Weighted average of `samples` at `(u, v)`.
///
/// Samples are `(u, v, height)` triples in tile-local units. Returns 0 for an
/// empty sample set.
pub fn idw_height(u: f64, v: f64, samples: &[(f64, f64, f64)], idw: IdwConfig) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for &(su, sv, height) in samples {
        let d = (u - su).hypot(v - sv).max(idw.min_distance);
        let w = d.powf(-idw.power);
        weighted += w * height;
        total += w;
    }
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

/// Builds tile meshes from elevation samples.
#[derive(Debug, Clone, Copy)]
pub struct MeshBuilder {
    resolution: u32,
    elevation_grid: u32,
    idw: IdwConfig,
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION, DEFAULT_ELEVATION_GRID, IdwConfig::default())
    }
}

impl MeshBuilder {
    /// Creates a builder. `resolution` is clamped to `2..=MAX_RESOLUTION`
    /// and `elevation_grid` to `2..=MAX_ELEVATION_GRID`.
    pub fn new(resolution: u32, elevation_grid: u32, idw: IdwConfig) -> Self {
        Self {
            resolution: resolution.clamp(2, MAX_RESOLUTION),
            elevation_grid: elevation_grid.clamp(2, MAX_ELEVATION_GRID),
            idw,
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn elevation_grid(&self) -> u32 {
        self.elevation_grid
    }

    /// Vertex count of every mesh this builder emits.
    pub fn vertex_count(&self) -> usize {
        let res = self.resolution as usize;
        res * res
    }

    /// Index count of every mesh this builder emits.
    pub fn index_count(&self) -> usize {
        let res = self.resolution as usize;
        (res - 1) * res * 2
    }

    /// Sample coordinates spread evenly over the tile, row-major from the
    /// northwest corner.
    pub fn neighborhood(&self, tile: TileKey) -> Result<Vec<GeoCoordinate>, CoordError> {
        let center = tile_center(tile)?;
        let ext = extent(tile)?;
        let n = self.elevation_grid;
        let step = 1.0 / (n - 1) as f64;

        let mut coords = Vec::with_capacity(n as usize * n as usize);
        for row in 0..n {
            let lat = center.lat() + ext.half_lat * (1.0 - 2.0 * row as f64 * step);
            for col in 0..n {
                let lng = center.lng() + ext.half_lng * (2.0 * col as f64 * step - 1.0);
                coords.push(GeoCoordinate::new(lat, lng)?);
            }
        }
        Ok(coords)
    }

    /// Builds the mesh for `tile` from its elevation samples and imagery.
    pub fn build(
        &self,
        tile: TileKey,
        samples: &[ElevationSample],
        image: RgbaImage,
    ) -> Result<MeshPayload, CoordError> {
        let center = tile_center(tile)?;
        let ext = extent(tile)?;
        let north = center.lat() + ext.half_lat;
        let west = center.lng() - ext.half_lng;

        // Samples in tile-local units, (0, 0) at the northwest corner
        let local: Vec<(f64, f64, f64)> = samples
            .iter()
            .map(|s| {
                (
                    (s.location.lng() - west) / (2.0 * ext.half_lng),
                    (north - s.location.lat()) / (2.0 * ext.half_lat),
                    s.elevation,
                )
            })
            .collect();

        let res = self.resolution;
        let step = 1.0 / (res - 1) as f64;
        let mut vertices = Vec::with_capacity(self.vertex_count());
        for row in 0..res {
            let v = row as f64 * step;
            for col in 0..res {
                let u = col as f64 * step;
                let height = idw_height(u, v, &local, self.idw);
                vertices.push(Vertex {
                    position: [(u - 0.5) as f32, height as f32, (v - 0.5) as f32],
                    uv: [u as f32, v as f32],
                });
            }
        }

        Ok(MeshPayload::new(
            tile,
            res,
            vertices,
            strip_indices(res),
            image,
        ))
    }
}

/// Row-pair triangle strips over a `res × res` grid.
fn strip_indices(res: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity((res as usize - 1) * res as usize * 2);
    for row in 0..res - 1 {
        for col in 0..res {
            indices.push(row * res + col);
            indices.push((row + 1) * res + col);
        }
    }
    indices
}
