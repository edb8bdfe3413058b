//! HTTP tile serving endpoint.
//!
//! `GET /tiles/:style/:zoom/:x/:y` serves from the store on a hit and
//! performs a single-flight upstream fetch on a miss. The service is a
//! public read-only mirror, so every response carries permissive CORS
//! headers.
//!
//! [`run`] owns the startup sequence: store and sweeper first, then the
//! listener, and only after the socket is bound the detached warm task.
//! The warm task is supervised but never awaited by the serving path -
//! its failure is logged and cannot block a request.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::ProxyConfig;
use crate::coord::TileCoord;
use crate::prefetch::Prefetcher;
use crate::provider::{HttpFetcher, TileFetcher, UpstreamError};
use crate::sites::{resolve_sites, SiteListClient};
use crate::store::TileStore;
use crate::tile::{TileKey, TileStyle};

/// Errors fatal to server startup.
///
/// Everything else (upstream failures, site-list failures) is recovered
/// at its call site and never escapes.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Fetcher(#[from] UpstreamError),
}

/// Shared state for the tile handler.
pub struct ServerState {
    pub store: Arc<TileStore>,
    pub fetcher: Arc<dyn TileFetcher>,
}

/// Builds the router serving the tile endpoint.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/tiles/:style/:zoom/:x/:y", get(serve_tile))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Adds the public-mirror CORS headers to every response, errors
/// included.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET"),
    );
    response
}

async fn serve_tile(
    Path((style, zoom, x, y)): Path<(String, u8, u32, u32)>,
    State(state): State<Arc<ServerState>>,
) -> Response {
    let style = match style.parse::<TileStyle>() {
        Ok(style) => style,
        Err(err) => {
            debug!(error = %err, "rejected tile request");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    let coord = TileCoord { x, y, zoom };
    let key = TileKey::new(style, coord);

    // Single-flight: concurrent misses for the same key coalesce onto
    // one upstream fetch; the winner's bytes are stored and shared.
    let fetcher = Arc::clone(&state.fetcher);
    let result = state
        .store
        .get_or_try_insert_with(key, async move { fetcher.fetch(style, coord).await })
        .await;

    match result {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, HeaderValue::from_static("image/png"))],
            bytes,
        )
            .into_response(),
        Err(err) => {
            error!(tile = %key, error = %err, "upstream fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to load tile {key}: {err}"),
            )
                .into_response()
        }
    }
}

/// Runs the tile proxy until the serve loop ends.
///
/// Binds the listener before launching the warm task so clients can be
/// served while (and regardless of whether) warming is still running.
pub async fn run(config: ProxyConfig) -> Result<(), ServeError> {
    let store = Arc::new(TileStore::new(config.ttl));
    let sweeper = store.spawn_sweeper(config.sweep_interval);

    let fetcher: Arc<dyn TileFetcher> =
        Arc::new(HttpFetcher::with_timeout(config.upstream_timeout)?);

    let state = Arc::new(ServerState {
        store: Arc::clone(&store),
        fetcher: Arc::clone(&fetcher),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    info!(addr = %addr, "tile proxy listening");

    spawn_warm_task(&config, store, fetcher);

    let result = axum::serve(listener, router(state)).await;
    sweeper.abort();
    result.map_err(ServeError::Io)
}

/// Launches the detached cache-warm task with an explicit supervisor.
///
/// The supervisor only observes the task: it logs a panic or abort and
/// nothing more, so a broken warm run leaves the endpoint untouched.
fn spawn_warm_task(config: &ProxyConfig, store: Arc<TileStore>, fetcher: Arc<dyn TileFetcher>) {
    let prefetcher = Prefetcher::from_config(store, fetcher, config);
    let site_client = config
        .site_list
        .as_ref()
        .map(|sl| SiteListClient::new(sl.url.clone(), sl.token.clone()));

    let warm_task = tokio::spawn(async move {
        let sites = resolve_sites(site_client.as_ref()).await;
        let summary = prefetcher.run(&sites).await;
        info!(
            fetched = summary.fetched,
            skipped = summary.skipped,
            failed = summary.failed,
            "cache warm run finished"
        );
    });

    tokio::spawn(async move {
        if let Err(err) = warm_task.await {
            error!(error = %err, "cache warm task did not finish");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_names_address() {
        let err = ServeError::Bind {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().contains("0.0.0.0:3000"));
    }
}
