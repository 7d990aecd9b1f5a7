//! Plain-data mesh payload handed from loader workers to the render thread.

use bytemuck::{Pod, Zeroable};
use image::RgbaImage;

use crate::coord::TileKey;

/// One mesh vertex: tile-local position and texture coordinate.
///
/// `position` is `[x, height, z]` with `x`, `z` in `[-0.5, 0.5]` (the unit
/// tile, `z` growing southward) and height in meters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Vertices, indices and decoded imagery for one tile.
///
/// Indices describe `resolution - 1` triangle strips, one per pair of
/// adjacent vertex rows, each `2 · resolution` indices long and laid out
/// back to back. The payload owns no GPU state and is immutable; it is
/// not `Clone`: each payload has exactly one consumer.
#[derive(Debug)]
pub struct MeshPayload {
    tile: TileKey,
    resolution: u32,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    image: RgbaImage,
    height_range: (f32, f32),
}

/// Owned pieces of a payload.
#[derive(Debug)]
pub struct MeshParts {
    pub tile: TileKey,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub image: RgbaImage,
}

impl MeshPayload {
    pub(crate) fn new(
        tile: TileKey,
        resolution: u32,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        image: RgbaImage,
    ) -> Self {
        let height_range = vertices
            .iter()
            .map(|v| v.position[1])
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), h| {
                (lo.min(h), hi.max(h))
            });
        Self {
            tile,
            resolution,
            vertices,
            indices,
            image,
            height_range,
        }
    }

    pub fn tile(&self) -> TileKey {
        self.tile
    }

    /// Vertices per side.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertex data as raw bytes, ready for a buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of indices in each triangle strip.
    pub fn strip_len(&self) -> usize {
        2 * self.resolution as usize
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Lowest and highest vertex height in meters.
    pub fn height_range(&self) -> (f32, f32) {
        self.height_range
    }

    /// Gives up the payload's buffers.
    pub fn into_parts(self) -> MeshParts {
        MeshParts {
            tile: self.tile,
            vertices: self.vertices,
            indices: self.indices,
            image: self.image,
        }
    }
}
