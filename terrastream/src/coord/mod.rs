//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and the tile pyramid used by elevation and imagery providers, plus the
//! zoom alignment offsets that let geometry from neighbouring zoom levels
//! sit together without seams.
//!
//! The projection is the conformal square pyramid: longitude is mapped
//! linearly onto `[0, 1]`, latitude through `-ln(tan((0.25 + lat/360)·π))`,
//! and both are multiplied by `2^zoom` to get tile indices.

mod alignment;
mod types;

pub use alignment::{ZoomAlignment, ZoomOffset};
pub use types::{
    tiles_per_side, CoordError, GeoBounds, GeoCoordinate, TileExtent, TileKey, DEFAULT_TILE_SIZE,
    MAX_LAT, MAX_LNG, MAX_ZOOM, MIN_LAT, MIN_LNG, PYRAMID_MAX_LAT,
};

use std::f64::consts::PI;

/// Projects a coordinate onto the unit square.
///
/// `x` is in `[0, 1]`; `y` may leave `[0, 1]` (and become infinite) for
/// latitudes beyond [`PYRAMID_MAX_LAT`].
#[inline]
fn normalize(coord: GeoCoordinate) -> (f64, f64) {
    let x = (coord.lng() + 180.0) / 360.0;
    let v = -((0.25 + coord.lat() / 360.0) * PI).tan().ln();
    let y = 0.5 + v / (2.0 * PI);
    (x, y)
}

/// Inverse of [`normalize`] for a unit-square position.
#[inline]
fn denormalize(x: f64, y: f64) -> (f64, f64) {
    let lng = x * 360.0 - 180.0;
    let v = (2.0 * y - 1.0) * PI;
    let lat = (2.0 * (-v).exp().atan() - PI / 2.0).to_degrees();
    (lat, lng)
}

/// Converts a geographic coordinate to the tile containing it.
///
/// The coordinate is first scaled to pixel space (`tile_size · 2^zoom`
/// pixels per axis) and then divided back down by `tile_size`. Latitudes
/// beyond the pyramid's pole cut-off ([`PYRAMID_MAX_LAT`]) clamp to the first
/// or last row, so the returned tile's bounds do not contain such a
/// coordinate; containment only holds within `±PYRAMID_MAX_LAT`.
///
/// # Arguments
///
/// * `coord` - A validated coordinate
/// * `tile_size` - Tile edge length in pixels
/// * `zoom` - Zoom level (0 to [`MAX_ZOOM`])
#[inline]
pub fn to_tile(coord: GeoCoordinate, tile_size: u32, zoom: u8) -> Result<TileKey, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    if tile_size == 0 {
        return Err(CoordError::InvalidTileSize(tile_size));
    }

    let n = tiles_per_side(zoom) as f64;
    let size = tile_size as f64;
    let (nx, ny) = normalize(coord);

    // World coordinates -> pixel coordinates -> tile indices
    let pixel_x = nx * size * n;
    let pixel_y = ny * size * n;
    let x = (pixel_x / size).floor().clamp(0.0, n - 1.0);
    let y = (pixel_y / size).floor().clamp(0.0, n - 1.0);

    Ok(TileKey::new(zoom, x as u32, y as u32))
}

/// Converts a tile back to the coordinate of its northwest corner.
///
/// Fails with [`CoordError::ProjectionOutOfRange`] when either index is
/// outside `[0, 2^zoom)`.
#[inline]
pub fn to_geo(tile: TileKey, tile_size: u32) -> Result<GeoCoordinate, CoordError> {
    if tile_size == 0 {
        return Err(CoordError::InvalidTileSize(tile_size));
    }
    if !tile.is_valid() {
        return Err(out_of_range(tile.zoom, tile.x as f64, tile.y as f64));
    }
    // Tile indices -> pixel coordinates -> fractional tile position
    let size = tile_size as f64;
    let pixel_x = tile.x as f64 * size;
    let pixel_y = tile.y as f64 * size;
    corner_at(tile.zoom, pixel_x / size, pixel_y / size)
}

/// Coordinate at a fractional tile position, allowing the far edges
/// (`x == 2^zoom`, `y == 2^zoom`).
fn corner_at(zoom: u8, x: f64, y: f64) -> Result<GeoCoordinate, CoordError> {
    let n = tiles_per_side(zoom) as f64;
    if !(0.0..=n).contains(&x) || !(0.0..=n).contains(&y) {
        return Err(out_of_range(zoom, x, y));
    }
    let (lat, lng) = denormalize(x / n, y / n);
    GeoCoordinate::new(lat, lng).map_err(|_| out_of_range(zoom, x, y))
}

fn out_of_range(zoom: u8, x: f64, y: f64) -> CoordError {
    CoordError::ProjectionOutOfRange {
        zoom,
        x: x.floor() as i64,
        y: y.floor() as i64,
    }
}

/// Computes the geographic half-width of a tile.
///
/// The projection is not linear in latitude, so the extent is measured
/// rather than derived: half the delta between this tile's corner and the
/// corner of the next tile along each axis at the same zoom.
///
/// Latitude is measured toward the `y + 1` (southern) neighbor, whose corner
/// is this tile's own south edge. Row 0 has no northern neighbor, while the
/// far edge `y == 2^zoom` keeps the southern corner defined for the last row.
pub fn extent(tile: TileKey) -> Result<TileExtent, CoordError> {
    if !tile.is_valid() {
        return Err(out_of_range(tile.zoom, tile.x as f64, tile.y as f64));
    }
    let corner = corner_at(tile.zoom, tile.x as f64, tile.y as f64)?;
    let east = corner_at(tile.zoom, tile.x as f64 + 1.0, tile.y as f64)?;
    let south = corner_at(tile.zoom, tile.x as f64, tile.y as f64 + 1.0)?;

    Ok(TileExtent {
        half_lat: (corner.lat() - south.lat()) / 2.0,
        half_lng: (east.lng() - corner.lng()) / 2.0,
    })
}

/// Geographic center of a tile (midpoint of its corner-to-corner span).
pub fn tile_center(tile: TileKey) -> Result<GeoCoordinate, CoordError> {
    let corner = to_geo(tile, DEFAULT_TILE_SIZE)?;
    let ext = extent(tile)?;
    GeoCoordinate::new(corner.lat() - ext.half_lat, corner.lng() + ext.half_lng)
        .map_err(|_| out_of_range(tile.zoom, tile.x as f64, tile.y as f64))
}

/// Geographic rectangle covered by a tile.
pub fn tile_bounds(tile: TileKey) -> Result<GeoBounds, CoordError> {
    Ok(GeoBounds::around(tile_center(tile)?, extent(tile)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let tile = to_tile(coord(40.7128, -74.0060), 256, 16).unwrap();
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.zoom, 16);
    }

    #[test]
    fn test_tile_size_does_not_change_index() {
        let c = coord(39.7391536, -104.9847034);
        for size in [1, 256, 512, 1000] {
            assert_eq!(to_tile(c, size, 12).unwrap(), to_tile(c, 256, 12).unwrap());
        }
    }

    #[test]
    fn test_invalid_zoom_and_size() {
        assert!(matches!(
            to_tile(coord(0.0, 0.0), 256, MAX_ZOOM + 1),
            Err(CoordError::InvalidZoom(_))
        ));
        assert!(matches!(
            to_tile(coord(0.0, 0.0), 0, 3),
            Err(CoordError::InvalidTileSize(0))
        ));
    }

    #[test]
    fn test_poles_clamp_to_edge_rows() {
        let north = to_tile(coord(90.0, 0.0), 256, 4).unwrap();
        let south = to_tile(coord(-90.0, 0.0), 256, 4).unwrap();
        assert_eq!(north.y, 0);
        assert_eq!(south.y, 15);
        let east = to_tile(coord(0.0, 180.0), 256, 4).unwrap();
        assert_eq!(east.x, 15);
    }

    #[test]
    fn test_to_geo_northwest_corner() {
        let corner = to_geo(TileKey::new(0, 0, 0), 256).unwrap();
        assert!((corner.lat() - PYRAMID_MAX_LAT).abs() < 1e-6);
        assert_eq!(corner.lng(), -180.0);
    }

    #[test]
    fn test_to_geo_rejects_row_outside_pyramid() {
        let result = to_geo(TileKey::new(3, 0, 8), 256);
        assert!(matches!(
            result,
            Err(CoordError::ProjectionOutOfRange { zoom: 3, y: 8, .. })
        ));
    }

    #[test]
    fn test_equator_tile_at_zoom_10() {
        let corner = to_geo(TileKey::new(10, 512, 512), 256).unwrap();
        assert!(corner.lat().abs() < 1e-9);
        assert!(corner.lng().abs() < 1e-9);
    }

    #[test]
    fn test_extent_shrinks_toward_pole() {
        let equator = extent(TileKey::new(8, 128, 128)).unwrap();
        let polar = extent(TileKey::new(8, 128, 5)).unwrap();
        assert!(polar.half_lat < equator.half_lat);
        // Longitude is linear so every tile at a zoom has the same width
        assert!((polar.half_lng - equator.half_lng).abs() < 1e-12);
    }

    #[test]
    fn test_bottom_row_extent_is_defined() {
        let ext = extent(TileKey::new(2, 0, 3)).unwrap();
        assert!(ext.half_lat > 0.0);
    }

    #[test]
    fn test_denver_bounds_contain_denver() {
        let denver = GeoCoordinate::DENVER;
        let tile = to_tile(denver, 256, 15).unwrap();
        assert!(tile_bounds(tile).unwrap().contains(denver));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Containment holds inside the pyramid; polar rows are covered
            // by test_polar_latitudes_clamp_to_edge_rows.
            #[test]
            fn test_tile_bounds_contain_coordinate(
                lat in -85.0..85.0_f64,
                lng in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let c = coord(lat, lng);
                let tile = to_tile(c, DEFAULT_TILE_SIZE, zoom)?;
                let bounds = tile_bounds(tile)?;
                prop_assert!(
                    bounds.contains(c),
                    "{} not inside {:?} for tile {}", c, bounds, tile
                );
            }

            #[test]
            fn test_polar_latitudes_clamp_to_edge_rows(
                lat in (PYRAMID_MAX_LAT + 1e-6)..=MAX_LAT,
                lng in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let north = to_tile(coord(lat, lng), DEFAULT_TILE_SIZE, zoom)?;
                let south = to_tile(coord(-lat, lng), DEFAULT_TILE_SIZE, zoom)?;
                prop_assert_eq!(north.y, 0);
                prop_assert_eq!(south.y as u64, tiles_per_side(zoom) - 1);
                prop_assert!(tile_bounds(north)?.north <= PYRAMID_MAX_LAT + 1e-6);
            }

            #[test]
            fn test_roundtrip_within_one_tile(
                lat in -85.0..85.0_f64,
                lng in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let c = coord(lat, lng);
                let tile = to_tile(c, DEFAULT_TILE_SIZE, zoom)?;
                let back = to_geo(tile, DEFAULT_TILE_SIZE)?;
                let ext = extent(tile)?;
                prop_assert!((back.lat() - lat).abs() <= 2.0 * ext.half_lat + 1e-9);
                prop_assert!((back.lng() - lng).abs() <= 2.0 * ext.half_lng + 1e-9);
            }

            #[test]
            fn test_to_geo_in_bounds(
                row_raw in 0u32..65536,
                col_raw in 0u32..65536,
                zoom in 0u8..=16
            ) {
                let n = tiles_per_side(zoom) as u32;
                let tile = TileKey::new(zoom, col_raw % n, row_raw % n);
                let geo = to_geo(tile, DEFAULT_TILE_SIZE)?;
                prop_assert!((MIN_LAT..=MAX_LAT).contains(&geo.lat()));
                prop_assert!((MIN_LNG..=MAX_LNG).contains(&geo.lng()));
            }

            #[test]
            fn test_longitude_monotonic(
                lat in 0.0..1.0_f64,
                lng1 in -180.0..-90.0_f64,
                lng2 in -90.0..0.0_f64,
                zoom in 10u8..=15
            ) {
                let a = to_tile(coord(lat, lng1), DEFAULT_TILE_SIZE, zoom)?;
                let b = to_tile(coord(lat, lng2), DEFAULT_TILE_SIZE, zoom)?;
                prop_assert!(a.x < b.x);
            }
        }
    }
}
