//! Cache-warming scheduler.
//!
//! Walks every (site, zoom) pair once at startup and populates the tile
//! store around each site. Sites, zooms and tiles are all processed
//! sequentially: one upstream request is in flight at a time, which is
//! the throttle that keeps the warm run from overwhelming the providers.
//! Individual tile failures are logged and skipped; nothing aborts the
//! run.
//!
//! Only the dark style is warmed - it is the style the map frontends
//! request by default.

use std::ops::RangeInclusive;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ProxyConfig, DEFAULT_PREFETCH_RADIUS_KM, DEFAULT_PREFETCH_ZOOMS};
use crate::coord::tile_range;
use crate::provider::TileFetcher;
use crate::sites::Site;
use crate::store::TileStore;
use crate::tile::{TileKey, TileStyle};

/// Outcome counters for one warm run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    /// Tiles fetched from upstream and stored.
    pub fetched: u64,
    /// Tiles skipped because they were already cached.
    pub skipped: u64,
    /// Tiles whose fetch failed and was skipped.
    pub failed: u64,
}

/// Sequential cache warmer.
pub struct Prefetcher {
    store: Arc<TileStore>,
    fetcher: Arc<dyn TileFetcher>,
    zooms: RangeInclusive<u8>,
    radius_km: f64,
}

impl Prefetcher {
    /// Creates a prefetcher with the default zoom range and radius.
    pub fn new(store: Arc<TileStore>, fetcher: Arc<dyn TileFetcher>) -> Self {
        Self {
            store,
            fetcher,
            zooms: DEFAULT_PREFETCH_ZOOMS,
            radius_km: DEFAULT_PREFETCH_RADIUS_KM,
        }
    }

    /// Creates a prefetcher configured from a [`ProxyConfig`].
    pub fn from_config(
        store: Arc<TileStore>,
        fetcher: Arc<dyn TileFetcher>,
        config: &ProxyConfig,
    ) -> Self {
        Self::new(store, fetcher)
            .with_zooms(config.prefetch_zooms.clone())
            .with_radius_km(config.prefetch_radius_km)
    }

    /// Sets the zoom levels warmed per site.
    pub fn with_zooms(mut self, zooms: RangeInclusive<u8>) -> Self {
        self.zooms = zooms;
        self
    }

    /// Sets the warmed radius around each site.
    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    /// Warms the store for every site, one tile at a time.
    pub async fn run(&self, sites: &[Site]) -> PrefetchSummary {
        let mut summary = PrefetchSummary::default();

        for site in sites {
            info!(site = %site.name, "warming cache for site");
            let before = summary;

            for zoom in self.zooms.clone() {
                let range = tile_range(site.lat, site.lon, zoom, self.radius_km);
                debug!(
                    site = %site.name,
                    zoom,
                    tiles = range.count(),
                    "warming tile range"
                );

                for coord in range.tiles() {
                    let key = TileKey::new(TileStyle::Dark, coord);
                    if self.store.contains(&key) {
                        summary.skipped += 1;
                        continue;
                    }

                    match self.fetcher.fetch(TileStyle::Dark, coord).await {
                        Ok(bytes) => {
                            self.store.put(key, bytes).await;
                            summary.fetched += 1;
                        }
                        Err(err) => {
                            // No retry: the tile will be fetched on demand
                            // if a client ever asks for it.
                            warn!(tile = %key, error = %err, "prefetch failed, skipping tile");
                            summary.failed += 1;
                        }
                    }
                }
            }

            info!(
                site = %site.name,
                fetched = summary.fetched - before.fetched,
                skipped = summary.skipped - before.skipped,
                failed = summary.failed - before.failed,
                "site warm complete"
            );
        }

        summary
    }
}
