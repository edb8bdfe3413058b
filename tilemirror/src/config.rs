//! Proxy configuration.
//!
//! All externally meaningful constants live here with their defaults.
//! The struct is built once at startup and passed by reference; there is
//! no config file.

use std::ops::RangeInclusive;
use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default cache entry time-to-live (24 hours).
pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

/// Default expired-entry sweep interval.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 120;

/// Default per-request upstream timeout.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 5;

/// Default zoom levels warmed by the prefetch scheduler.
pub const DEFAULT_PREFETCH_ZOOMS: RangeInclusive<u8> = 14..=18;

/// Default prefetch search radius around each site.
pub const DEFAULT_PREFETCH_RADIUS_KM: f64 = 10.0;

/// Remote site-list source settings.
#[derive(Clone, Debug)]
pub struct SiteListConfig {
    /// Status endpoint returning the `{"hosts": [...]}` payload.
    pub url: String,
    /// Optional bearer token for the status endpoint.
    pub token: Option<String>,
}

/// Top-level configuration for the tile proxy.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    /// TCP port the HTTP endpoint listens on.
    pub port: u16,

    /// Cache entry time-to-live.
    pub ttl: Duration,

    /// Interval between expired-entry sweeps.
    pub sweep_interval: Duration,

    /// Per-request timeout toward tile upstreams.
    pub upstream_timeout: Duration,

    /// Zoom levels warmed per site.
    pub prefetch_zooms: RangeInclusive<u8>,

    /// Search radius warmed around each site, in kilometers.
    pub prefetch_radius_km: f64,

    /// Remote site-list source; `None` goes straight to the built-in
    /// list.
    pub site_list: Option<SiteListConfig>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            prefetch_zooms: DEFAULT_PREFETCH_ZOOMS,
            prefetch_radius_km: DEFAULT_PREFETCH_RADIUS_KM,
            site_list: None,
        }
    }
}

impl ProxyConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn with_prefetch_zooms(mut self, zooms: RangeInclusive<u8>) -> Self {
        self.prefetch_zooms = zooms;
        self
    }

    pub fn with_prefetch_radius_km(mut self, radius_km: f64) -> Self {
        self.prefetch_radius_km = radius_km;
        self
    }

    pub fn with_site_list(mut self, url: impl Into<String>, token: Option<String>) -> Self {
        self.site_list = Some(SiteListConfig {
            url: url.into(),
            token,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.ttl, Duration::from_secs(86_400));
        assert_eq!(config.sweep_interval, Duration::from_secs(120));
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert_eq!(config.prefetch_zooms, 14..=18);
        assert_eq!(config.prefetch_radius_km, 10.0);
        assert!(config.site_list.is_none());
    }

    #[test]
    fn test_builder_setters() {
        let config = ProxyConfig::default()
            .with_port(8080)
            .with_ttl(Duration::from_secs(60))
            .with_sweep_interval(Duration::from_secs(5))
            .with_prefetch_zooms(12..=13)
            .with_prefetch_radius_km(2.5)
            .with_site_list("http://status.internal/status", Some("secret".into()));

        assert_eq!(config.port, 8080);
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
        assert_eq!(config.prefetch_zooms, 12..=13);
        assert_eq!(config.prefetch_radius_km, 2.5);

        let site_list = config.site_list.unwrap();
        assert_eq!(site_list.url, "http://status.internal/status");
        assert_eq!(site_list.token.as_deref(), Some("secret"));
    }
}
