//! Placement of tile meshes in world space.
//!
//! World space is anchored at the center of an origin tile. One origin-zoom
//! tile spans `tile_world_size` units along `x` (east) and `z` (south);
//! heights pass through unscaled.
//!
//! A tile at another zoom is placed relative to the tile containing the
//! origin center at that zoom (its anchor). The anchor's displacement from
//! the origin comes from [`ZoomAlignment`], and every other tile is laid out
//! from the anchor by its key delta, scaled by `2^(origin_zoom - zoom)`.

use crate::coord::{
    extent, tile_center, to_tile, CoordError, GeoCoordinate, TileKey, ZoomAlignment,
};

/// Where to draw one tile's unit mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    /// World position of the tile center
    pub translation: [f32; 3],
    /// Zoom scale relative to the origin tile, `2^(origin_zoom - zoom)`
    pub scale: f32,
    /// World units per unit of tile-local `x`/`z`
    pub horizontal: f32,
}

impl WorldTransform {
    /// Maps a tile-local vertex position into world space.
    pub fn apply(&self, local: [f32; 3]) -> [f32; 3] {
        [
            self.translation[0] + local[0] * self.horizontal,
            self.translation[1] + local[1],
            self.translation[2] + local[2] * self.horizontal,
        ]
    }

    /// Column-major 4×4 model matrix.
    pub fn to_matrix(&self) -> [f32; 16] {
        let [tx, ty, tz] = self.translation;
        let h = self.horizontal;
        [
            h, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, h, 0.0, //
            tx, ty, tz, 1.0,
        ]
    }
}

/// Computes [`WorldTransform`]s for tiles around a fixed origin.
pub struct WorldFrame {
    origin: TileKey,
    origin_center: GeoCoordinate,
    tile_size: u32,
    tile_world_size: f64,
    units_per_deg_lat: f64,
    units_per_deg_lng: f64,
    alignment: ZoomAlignment,
}

impl WorldFrame {
    /// Anchors world space at the center of `origin`.
    pub fn new(origin: TileKey, tile_size: u32, tile_world_size: f64) -> Result<Self, CoordError> {
        let origin_center = tile_center(origin)?;
        let ext = extent(origin)?;
        Ok(Self {
            origin,
            origin_center,
            tile_size,
            tile_world_size,
            units_per_deg_lat: tile_world_size / (2.0 * ext.half_lat),
            units_per_deg_lng: tile_world_size / (2.0 * ext.half_lng),
            alignment: ZoomAlignment::new(tile_size),
        })
    }

    pub fn origin(&self) -> TileKey {
        self.origin
    }

    pub fn origin_center(&self) -> GeoCoordinate {
        self.origin_center
    }

    /// Converts a geographic coordinate to world `(x, z)` using the origin
    /// tile's degrees-to-units ratio.
    pub fn geo_to_world(&self, coord: GeoCoordinate) -> [f64; 2] {
        [
            (coord.lng() - self.origin_center.lng()) * self.units_per_deg_lng,
            (self.origin_center.lat() - coord.lat()) * self.units_per_deg_lat,
        ]
    }

    /// Placement for `key`.
    pub fn transform_for(&self, key: TileKey) -> Result<WorldTransform, CoordError> {
        let scale = 2f64.powi(self.origin.zoom as i32 - key.zoom as i32);
        let anchor = to_tile(self.origin_center, self.tile_size, key.zoom)?;
        let offset =
            self.alignment
                .offset_between_zooms(self.origin_center, self.origin.zoom, key.zoom)?;

        let step = self.tile_world_size * scale;
        let x = offset.d_lng * self.units_per_deg_lng
            + (key.x as f64 - anchor.x as f64) * step;
        let z = -offset.d_lat * self.units_per_deg_lat
            + (key.y as f64 - anchor.y as f64) * step;

        Ok(WorldTransform {
            translation: [x as f32, 0.0, z as f32],
            scale: scale as f32,
            horizontal: step as f32,
        })
    }

    /// Number of memoized zoom offsets.
    pub fn memoized_offsets(&self) -> usize {
        self.alignment.memoized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::DEFAULT_TILE_SIZE;

    fn frame() -> WorldFrame {
        WorldFrame::new(TileKey::new(15, 6800, 12400), DEFAULT_TILE_SIZE, 100.0).unwrap()
    }

    #[test]
    fn test_origin_sits_at_world_zero() {
        let t = frame().transform_for(TileKey::new(15, 6800, 12400)).unwrap();
        assert_eq!(t.translation, [0.0, 0.0, 0.0]);
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.horizontal, 100.0);
    }

    #[test]
    fn test_same_zoom_neighbors_step_by_tile_size() {
        let frame = frame();
        let east = frame.transform_for(TileKey::new(15, 6801, 12400)).unwrap();
        let south = frame.transform_for(TileKey::new(15, 6800, 12401)).unwrap();
        assert!((east.translation[0] - 100.0).abs() < 1e-3);
        assert!(east.translation[2].abs() < 1e-3);
        assert!((south.translation[2] - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_coarser_zoom_doubles_scale() {
        let t = frame().transform_for(TileKey::new(14, 3400, 6200)).unwrap();
        assert_eq!(t.scale, 2.0);
        assert_eq!(t.horizontal, 200.0);
    }

    #[test]
    fn test_anchor_center_lands_on_its_geographic_position() {
        let frame = frame();
        let anchor = to_tile(frame.origin_center(), DEFAULT_TILE_SIZE, 14).unwrap();
        let t = frame.transform_for(anchor).unwrap();
        let expected = frame.geo_to_world(tile_center(anchor).unwrap());
        assert!((t.translation[0] as f64 - expected[0]).abs() < 1e-2);
        assert!((t.translation[2] as f64 - expected[1]).abs() < 1e-2);
    }

    #[test]
    fn test_apply_scales_local_positions() {
        let t = WorldTransform {
            translation: [10.0, 0.0, -5.0],
            scale: 2.0,
            horizontal: 200.0,
        };
        assert_eq!(t.apply([0.5, 3.0, -0.5]), [110.0, 3.0, -105.0]);
        let m = t.to_matrix();
        assert_eq!(m[0], 200.0);
        assert_eq!(m[12], 10.0);
        assert_eq!(m[14], -5.0);
    }
}
