//! Value types shared by the projection and alignment code.

use std::fmt;

use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LNG: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LNG: f64 = 180.0;

/// Latitude limit of the square tile pyramid (the projection's pole cut-off).
pub const PYRAMID_MAX_LAT: f64 = 85.05112878;

/// Highest zoom level the pyramid supports.
///
/// Keeps `2^zoom` inside `u32` tile indices.
pub const MAX_ZOOM: u8 = 30;

/// Default edge length of a tile in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Slack used when testing a coordinate against tile bounds.
const BOUNDS_EPSILON: f64 = 1e-9;

/// Errors raised by coordinate construction and projection.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude or longitude outside the valid range.
    #[error("Invalid coordinate: latitude {lat}, longitude {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Tile indices outside `[0, 2^zoom)` or an inverse projection that
    /// produced an impossible coordinate.
    #[error("Projection out of range: tile ({x}, {y}) at zoom {zoom}")]
    ProjectionOutOfRange { zoom: u8, x: i64, y: i64 },

    /// Zoom level above [`MAX_ZOOM`].
    #[error("Invalid zoom level: {0} (max {})", MAX_ZOOM)]
    InvalidZoom(u8),

    /// Tile size of zero pixels.
    #[error("Invalid tile size: {0}")]
    InvalidTileSize(u32),
}

/// A point on the globe in degrees.
///
/// Immutable once built; [`GeoCoordinate::new`] rejects values outside
/// `[-90, 90]` × `[-180, 180]` (including NaN).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    lat: f64,
    lng: f64,
}

impl GeoCoordinate {
    /// Denver, Colorado. Used as the default start location.
    pub const DENVER: GeoCoordinate = GeoCoordinate {
        lat: 39.7391536,
        lng: -104.9847034,
    };

    /// Creates a coordinate, validating both components.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) || !(MIN_LNG..=MAX_LNG).contains(&lng) {
            return Err(CoordError::InvalidCoordinate { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Key usable for hashing; distinguishes coordinates bit-for-bit.
    pub(crate) fn bits(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lng.to_bits())
    }
}

impl Default for GeoCoordinate {
    fn default() -> Self {
        Self::DENVER
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.lat, self.lng)
    }
}

/// Identity of one tile in the pyramid.
///
/// Rows (`y`) grow southward, columns (`x`) grow eastward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Zoom level
    pub zoom: u8,
    /// Column
    pub x: u32,
    /// Row
    pub y: u32,
}

impl TileKey {
    /// Creates a tile key without range checks.
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Number of tiles along each axis at this key's zoom.
    pub fn tiles_per_side(&self) -> u64 {
        tiles_per_side(self.zoom)
    }

    /// Returns true when both indices fall inside `[0, 2^zoom)`.
    pub fn is_valid(&self) -> bool {
        self.zoom <= MAX_ZOOM
            && (self.x as u64) < self.tiles_per_side()
            && (self.y as u64) < self.tiles_per_side()
    }

    /// The tile `dx` columns and `dy` rows away at the same zoom.
    ///
    /// Fails with [`CoordError::ProjectionOutOfRange`] past the edge of the
    /// pyramid; longitude does not wrap.
    pub fn neighbor(&self, dx: i64, dy: i64) -> Result<TileKey, CoordError> {
        let x = self.x as i64 + dx;
        let y = self.y as i64 + dy;
        let n = self.tiles_per_side() as i64;
        if x < 0 || y < 0 || x >= n || y >= n {
            return Err(CoordError::ProjectionOutOfRange {
                zoom: self.zoom,
                x,
                y,
            });
        }
        Ok(TileKey::new(self.zoom, x as u32, y as u32))
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Half-width of a tile in degrees around its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileExtent {
    /// Half the tile's latitude span
    pub half_lat: f64,
    /// Half the tile's longitude span
    pub half_lng: f64,
}

/// Geographic rectangle covered by a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Builds bounds from a center and extent.
    pub fn around(center: GeoCoordinate, extent: TileExtent) -> Self {
        Self {
            north: center.lat() + extent.half_lat,
            south: center.lat() - extent.half_lat,
            west: center.lng() - extent.half_lng,
            east: center.lng() + extent.half_lng,
        }
    }

    /// Inclusive containment test with a tiny slack for rounding.
    pub fn contains(&self, coord: GeoCoordinate) -> bool {
        coord.lat() <= self.north + BOUNDS_EPSILON
            && coord.lat() >= self.south - BOUNDS_EPSILON
            && coord.lng() >= self.west - BOUNDS_EPSILON
            && coord.lng() <= self.east + BOUNDS_EPSILON
    }
}

/// Number of tiles per axis at `zoom`.
#[inline]
pub fn tiles_per_side(zoom: u8) -> u64 {
    1u64 << zoom.min(MAX_ZOOM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert!(matches!(
            GeoCoordinate::new(90.5, 0.0),
            Err(CoordError::InvalidCoordinate { .. })
        ));
        assert!(GeoCoordinate::new(0.0, -180.1).is_err());
        assert!(GeoCoordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_coordinate_accepts_limits() {
        assert!(GeoCoordinate::new(90.0, 180.0).is_ok());
        assert!(GeoCoordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_default_is_denver() {
        let c = GeoCoordinate::default();
        assert_eq!(c.lat(), 39.7391536);
        assert_eq!(c.lng(), -104.9847034);
    }

    #[test]
    fn test_tile_key_equality_over_all_fields() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(TileKey::new(15, 1000, 1500));
        assert!(set.contains(&TileKey::new(15, 1000, 1500)));
        assert!(!set.contains(&TileKey::new(14, 1000, 1500)));
        assert!(!set.contains(&TileKey::new(15, 1001, 1500)));
        assert!(!set.contains(&TileKey::new(15, 1000, 1501)));
    }

    #[test]
    fn test_neighbor_past_pole_is_out_of_range() {
        let top = TileKey::new(3, 2, 0);
        assert!(matches!(
            top.neighbor(0, -1),
            Err(CoordError::ProjectionOutOfRange { y: -1, .. })
        ));
        assert_eq!(top.neighbor(1, 1).unwrap(), TileKey::new(3, 3, 1));
        assert!(TileKey::new(3, 7, 7).neighbor(1, 0).is_err());
    }

    #[test]
    fn test_tile_key_display() {
        assert_eq!(TileKey::new(15, 1000, 1500).to_string(), "15/1000/1500");
    }
}
