//! Tile download over HTTP.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

use super::tile_url;
use crate::coord::TileCoord;
use crate::tile::TileStyle;

/// Fixed per-request timeout toward tile upstreams.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised while retrieving a tile from its provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("failed to build upstream HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed before a response arrived (DNS, connect,
    /// timeout).
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The response body could not be read.
    #[error("failed to read tile body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Downloads one tile's bytes from its provider.
///
/// The trait seam allows injecting mock fetchers in tests and keeps the
/// serving and prefetch paths independent of reqwest.
pub trait TileFetcher: Send + Sync {
    /// Fetches the raw bytes for the tile at `coord` in `style`.
    fn fetch(
        &self,
        style: TileStyle,
        coord: TileCoord,
    ) -> BoxFuture<'_, Result<Bytes, UpstreamError>>;
}

/// Real fetcher backed by a shared `reqwest::Client`.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the fixed 5-second request timeout.
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_timeout(UPSTREAM_TIMEOUT)
    }

    /// Creates a fetcher with a custom per-request timeout.
    ///
    /// Certificate validation is disabled on this client: some of the
    /// proxied tile hosts sit behind interception appliances presenting
    /// certificates that do not verify. The exception is confined to
    /// this client; nothing else in the process inherits it (the
    /// site-list client validates normally).
    pub fn with_timeout(timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self { client })
    }
}

impl TileFetcher for HttpFetcher {
    fn fetch(
        &self,
        style: TileStyle,
        coord: TileCoord,
    ) -> BoxFuture<'_, Result<Bytes, UpstreamError>> {
        Box::pin(async move {
            let url = tile_url(style, coord);

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|source| UpstreamError::Request {
                    url: url.clone(),
                    source,
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(UpstreamError::Status { url, status });
            }

            response
                .bytes()
                .await
                .map_err(|source| UpstreamError::Body { url, source })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_fetcher_builds() {
        assert!(HttpFetcher::new().is_ok());
        assert!(HttpFetcher::with_timeout(Duration::from_millis(100)).is_ok());
    }

    #[test]
    fn test_status_error_names_url_and_code() {
        let err = UpstreamError::Status {
            url: "https://a.basemaps.cartocdn.com/dark_all/14/1/1.png".to_string(),
            status: StatusCode::BAD_GATEWAY,
        };
        let message = err.to_string();
        assert!(message.contains("dark_all/14/1/1.png"));
        assert!(message.contains("502"));
    }
}
