//! Tile coordinate calculator.
//!
//! Converts a geographic radius around a point into the inclusive range of
//! Web Mercator tile indices covering it at a given zoom level. The radius
//! is turned into a degree bounding box using the fixed 1° ≈ 111 km
//! latitude approximation, with the longitude delta scaled by `cos(lat)`
//! to correct for meridian convergence.

mod types;

pub use types::{TileCoord, TileRange, TileRangeIter, KM_PER_DEGREE_LAT, MAX_LAT, MIN_LAT};

use std::f64::consts::PI;

/// Computes the tile index range covering `radius_km` around a point.
///
/// # Arguments
///
/// * `lat` - Latitude of the center in degrees
/// * `lon` - Longitude of the center in degrees
/// * `zoom` - Zoom level (practical range 0-22)
/// * `radius_km` - Search radius in kilometers
///
/// Indices are clamped into `[0, 2^zoom)`, so a radius that pushes the
/// bounding box past the edge of the tile grid simply truncates there.
/// The calculator puts no cap on the size of the returned range; bounding
/// the amount of work done per range is the caller's concern.
pub fn tile_range(lat: f64, lon: f64, zoom: u8, radius_km: f64) -> TileRange {
    let lat_delta = radius_km / KM_PER_DEGREE_LAT;
    let lon_delta = lat_delta * (lat * PI / 180.0).cos();

    let min_lat = lat - lat_delta;
    let max_lat = lat + lat_delta;
    let min_lon = lon - lon_delta;
    let max_lon = lon + lon_delta;

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = (n as i64) - 1;
    let clamp = |v: f64| (v.floor() as i64).clamp(0, max_index) as u32;

    // Y grows southward, so the northern edge (max_lat) gives min_y.
    TileRange {
        zoom,
        min_x: clamp(lon_to_x(min_lon, n)),
        max_x: clamp(lon_to_x(max_lon, n)),
        min_y: clamp(lat_to_y(max_lat, n)),
        max_y: clamp(lat_to_y(min_lat, n)),
    }
}

/// Converts a longitude to a fractional tile X index at grid size `n`.
#[inline]
fn lon_to_x(lon: f64, n: f64) -> f64 {
    (lon + 180.0) / 360.0 * n
}

/// Converts a latitude to a fractional tile Y index at grid size `n`.
#[inline]
fn lat_to_y(lat: f64, n: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n
}
