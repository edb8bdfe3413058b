//! Tile identity types.
//!
//! A tile is addressed by a rendering style plus a Web Mercator tile
//! coordinate. [`TileKey`] is the cache identity; its `Display` form
//! (`style-zoom-x-y`) is the canonical key used in logs.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::coord::TileCoord;

/// The requested style was not one of `dark`, `light`, `satellite`.
///
/// This is a client error; it is raised before any upstream I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tile style: {0}")]
pub struct InvalidStyle(pub String);

/// Rendering style of a tile, mapped to an upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileStyle {
    Dark,
    Light,
    Satellite,
}

impl TileStyle {
    /// All supported styles.
    pub const ALL: [TileStyle; 3] = [TileStyle::Dark, TileStyle::Light, TileStyle::Satellite];

    /// Lowercase style name as it appears in request paths and keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            TileStyle::Dark => "dark",
            TileStyle::Light => "light",
            TileStyle::Satellite => "satellite",
        }
    }
}

impl fmt::Display for TileStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TileStyle {
    type Err = InvalidStyle;

    fn from_str(s: &str) -> Result<Self, InvalidStyle> {
        match s {
            "dark" => Ok(TileStyle::Dark),
            "light" => Ok(TileStyle::Light),
            "satellite" => Ok(TileStyle::Satellite),
            other => Err(InvalidStyle(other.to_string())),
        }
    }
}

/// Cache identity of one raster tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub style: TileStyle,
    pub coord: TileCoord,
}

impl TileKey {
    pub fn new(style: TileStyle, coord: TileCoord) -> Self {
        Self { style, coord }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.style, self.coord.zoom, self.coord.x, self.coord.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_roundtrips_through_str() {
        for style in TileStyle::ALL {
            assert_eq!(style.as_str().parse::<TileStyle>(), Ok(style));
        }
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        let err = "foo".parse::<TileStyle>().unwrap_err();
        assert_eq!(err, InvalidStyle("foo".to_string()));
        assert!(err.to_string().contains("foo"));
    }

    #[test]
    fn test_style_parse_is_case_sensitive() {
        assert!("Dark".parse::<TileStyle>().is_err());
        assert!("SATELLITE".parse::<TileStyle>().is_err());
    }

    #[test]
    fn test_key_display_format() {
        let key = TileKey::new(
            TileStyle::Dark,
            TileCoord {
                x: 6030,
                y: 8443,
                zoom: 14,
            },
        );
        assert_eq!(key.to_string(), "dark-14-6030-8443");
    }

    #[test]
    fn test_keys_distinct_by_style() {
        let coord = TileCoord { x: 1, y: 2, zoom: 3 };
        assert_ne!(
            TileKey::new(TileStyle::Dark, coord),
            TileKey::new(TileStyle::Light, coord)
        );
    }
}
