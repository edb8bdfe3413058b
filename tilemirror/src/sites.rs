//! Geographic sites to warm the cache around.
//!
//! The site list comes from the monitoring service's status endpoint,
//! fetched once at startup; its JSON schema (`hosts`, `nome`, `local`)
//! is kept as-is. Any failure to obtain or decode the list falls back to
//! a built-in static list so startup never depends on the source being
//! reachable.

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// A named point of interest around which tiles are prefetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Site {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}

/// The site list could not be retrieved or decoded.
///
/// Never surfaced to tile clients; the caller falls back to
/// [`fallback_sites`].
#[derive(Debug, Error)]
pub enum SiteListError {
    #[error("site list request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("site list source returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Payload shape of the status endpoint.
#[derive(Debug, Deserialize)]
struct HostsPayload {
    hosts: Vec<HostRecord>,
}

/// One host entry; `local` is a `"lat, lng"` string.
#[derive(Debug, Deserialize)]
struct HostRecord {
    nome: Option<String>,
    local: Option<String>,
}

/// Client for the remote site-list source.
///
/// Uses a default reqwest client with normal certificate validation -
/// the relaxed-TLS exception applies only to tile upstreams.
pub struct SiteListClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl SiteListClient {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            token,
        }
    }

    /// Fetches and decodes the site list.
    ///
    /// Entries missing a name or location, or whose location does not
    /// parse, are logged and skipped rather than failing the list.
    pub async fn fetch(&self) -> Result<Vec<Site>, SiteListError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SiteListError::Status(status));
        }

        let payload: HostsPayload = response.json().await?;
        Ok(sites_from_payload(payload))
    }
}

/// Converts host records to sites, skipping malformed entries.
fn sites_from_payload(payload: HostsPayload) -> Vec<Site> {
    payload
        .hosts
        .into_iter()
        .filter_map(|record| {
            let (Some(name), Some(local)) = (record.nome, record.local) else {
                warn!("site entry missing name or location, skipping");
                return None;
            };
            match parse_location(&local) {
                Some((lat, lon)) => Some(Site::new(name, lat, lon)),
                None => {
                    warn!(site = %name, location = %local, "unparsable site location, skipping");
                    None
                }
            }
        })
        .collect()
}

/// Parses a `"lat, lng"` location string.
fn parse_location(local: &str) -> Option<(f64, f64)> {
    let (lat, lon) = local.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

/// Built-in sites used whenever the remote list is unavailable.
pub fn fallback_sites() -> Vec<Site> {
    vec![
        Site::new("Imperatriz", -5.5264, -47.4917),
        Site::new("Belém", -1.4558, -48.4902),
        Site::new("Aracruz", -19.8204, -40.2733),
    ]
}

/// Resolves the site list, falling back to the built-in list on any
/// failure or when no source is configured.
pub async fn resolve_sites(client: Option<&SiteListClient>) -> Vec<Site> {
    let Some(client) = client else {
        info!("no site list source configured, using built-in sites");
        return fallback_sites();
    };

    match client.fetch().await {
        Ok(sites) if !sites.is_empty() => {
            info!(count = sites.len(), "site list fetched");
            sites
        }
        Ok(_) => {
            warn!("site list source returned no usable sites, using built-in sites");
            fallback_sites()
        }
        Err(err) => {
            warn!(error = %err, "site list fetch failed, using built-in sites");
            fallback_sites()
        }
    }
}
