//! Upstream tile providers.
//!
//! Resolves a tile identity to its provider URL and downloads the raw
//! tile bytes. The fetcher is deliberately store-agnostic: it performs
//! the network call and nothing else.

mod fetch;

pub use fetch::{BoxFuture, HttpFetcher, TileFetcher, UpstreamError, UPSTREAM_TIMEOUT};

use crate::coord::TileCoord;
use crate::tile::TileStyle;

/// Builds the upstream URL for a tile.
///
/// Dark and light styles come from the Carto basemap CDN, satellite from
/// the Google tile endpoint (which orders its query parameters x, y, z).
pub fn tile_url(style: TileStyle, coord: TileCoord) -> String {
    match style {
        TileStyle::Dark => format!(
            "https://a.basemaps.cartocdn.com/dark_all/{}/{}/{}.png",
            coord.zoom, coord.x, coord.y
        ),
        TileStyle::Light => format!(
            "https://a.basemaps.cartocdn.com/light_all/{}/{}/{}.png",
            coord.zoom, coord.x, coord.y
        ),
        TileStyle::Satellite => format!(
            "https://mt1.google.com/vt/lyrs=s&x={}&y={}&z={}",
            coord.x, coord.y, coord.zoom
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COORD: TileCoord = TileCoord {
        x: 6030,
        y: 8443,
        zoom: 14,
    };

    #[test]
    fn test_dark_url() {
        assert_eq!(
            tile_url(TileStyle::Dark, COORD),
            "https://a.basemaps.cartocdn.com/dark_all/14/6030/8443.png"
        );
    }

    #[test]
    fn test_light_url() {
        assert_eq!(
            tile_url(TileStyle::Light, COORD),
            "https://a.basemaps.cartocdn.com/light_all/14/6030/8443.png"
        );
    }

    #[test]
    fn test_satellite_url_parameter_order() {
        assert_eq!(
            tile_url(TileStyle::Satellite, COORD),
            "https://mt1.google.com/vt/lyrs=s&x=6030&y=8443&z=14"
        );
    }
}
