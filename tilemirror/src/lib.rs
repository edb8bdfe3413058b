//! TileMirror - caching proxy for slippy-map tile providers.
//!
//! Sits in front of third-party tile providers, serves tiles from a
//! TTL-bounded in-memory cache, and warms that cache at startup around a
//! list of known geographic sites so first requests hit cache instead of
//! the upstream.

pub mod config;
pub mod coord;
pub mod logging;
pub mod prefetch;
pub mod provider;
pub mod server;
pub mod sites;
pub mod store;
pub mod tile;
