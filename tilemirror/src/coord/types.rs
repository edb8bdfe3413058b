//! Tile coordinate types.

/// Maximum latitude representable in Web Mercator (degrees).
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator (degrees).
pub const MIN_LAT: f64 = -85.05112878;

/// Kilometers per degree of latitude (fixed approximation).
pub const KM_PER_DEGREE_LAT: f64 = 111.0;

/// A single slippy-map tile index.
///
/// X grows eastward from the antimeridian, Y grows southward from the
/// north pole. At zoom `z` both indices range over `[0, 2^z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

/// A rectangular, inclusive range of tile indices at one zoom level.
///
/// Derived per (site, zoom) by [`tile_range`](super::tile_range) and
/// consumed by the prefetch loop; not retained anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl TileRange {
    /// Number of columns in the range.
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    /// Number of rows in the range.
    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Total number of tiles in the range.
    pub fn count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Returns true if the given tile lies within this range.
    pub fn contains(&self, coord: &TileCoord) -> bool {
        coord.zoom == self.zoom
            && (self.min_x..=self.max_x).contains(&coord.x)
            && (self.min_y..=self.max_y).contains(&coord.y)
    }

    /// Iterates over every tile in the range in row-major order.
    pub fn tiles(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            next_x: self.min_x,
            next_y: self.min_y,
            done: false,
        }
    }
}

/// Row-major iterator over the tiles of a [`TileRange`].
pub struct TileRangeIter {
    range: TileRange,
    next_x: u32,
    next_y: u32,
    done: bool,
}

impl Iterator for TileRangeIter {
    type Item = TileCoord;

    fn next(&mut self) -> Option<TileCoord> {
        if self.done {
            return None;
        }

        let coord = TileCoord {
            x: self.next_x,
            y: self.next_y,
            zoom: self.range.zoom,
        };

        if self.next_x < self.range.max_x {
            self.next_x += 1;
        } else if self.next_y < self.range.max_y {
            self.next_x = self.range.min_x;
            self.next_y += 1;
        } else {
            self.done = true;
        }

        Some(coord)
    }
}

impl IntoIterator for TileRange {
    type Item = TileCoord;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> TileRangeIter {
        self.tiles()
    }
}
