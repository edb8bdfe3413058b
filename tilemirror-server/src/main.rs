//! TileMirror server binary.
//!
//! Parses flags, initialises logging, and runs the tile proxy.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::error;

use tilemirror::config::{
    ProxyConfig, DEFAULT_PORT, DEFAULT_PREFETCH_RADIUS_KM, DEFAULT_SWEEP_INTERVAL_SECS,
    DEFAULT_TTL_SECS, DEFAULT_UPSTREAM_TIMEOUT_SECS,
};
use tilemirror::logging::init_logging;
use tilemirror::server;

#[derive(Debug, Parser)]
#[command(name = "tilemirror", about = "Caching proxy for slippy-map tile providers")]
struct Args {
    /// Port the tile endpoint listens on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Cache entry time-to-live in seconds.
    #[arg(long, default_value_t = DEFAULT_TTL_SECS)]
    ttl_secs: u64,

    /// Interval between expired-entry sweeps in seconds.
    #[arg(long, default_value_t = DEFAULT_SWEEP_INTERVAL_SECS)]
    sweep_interval_secs: u64,

    /// Per-request upstream timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS)]
    upstream_timeout_secs: u64,

    /// Lowest zoom level warmed around each site.
    #[arg(long, default_value_t = 14)]
    prefetch_min_zoom: u8,

    /// Highest zoom level warmed around each site.
    #[arg(long, default_value_t = 18)]
    prefetch_max_zoom: u8,

    /// Radius in kilometers warmed around each site.
    #[arg(long, default_value_t = DEFAULT_PREFETCH_RADIUS_KM)]
    prefetch_radius_km: f64,

    /// Status endpoint providing the site list. Without it the built-in
    /// site list is used.
    #[arg(long)]
    site_list_url: Option<String>,

    /// Bearer token for the site list endpoint.
    #[arg(long, requires = "site_list_url")]
    site_list_token: Option<String>,

    /// Directory for the session log file.
    #[arg(long, default_value = "logs")]
    log_dir: String,
}

impl Args {
    fn into_config(self) -> ProxyConfig {
        let mut config = ProxyConfig::default()
            .with_port(self.port)
            .with_ttl(Duration::from_secs(self.ttl_secs))
            .with_sweep_interval(Duration::from_secs(self.sweep_interval_secs))
            .with_upstream_timeout(Duration::from_secs(self.upstream_timeout_secs))
            .with_prefetch_zooms(self.prefetch_min_zoom..=self.prefetch_max_zoom)
            .with_prefetch_radius_km(self.prefetch_radius_km);

        if let Some(url) = self.site_list_url {
            config = config.with_site_list(url, self.site_list_token);
        }

        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _logging_guard = match init_logging(&args.log_dir, "tilemirror.log") {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialise logging: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = server::run(args.into_config()).await {
        error!(error = %err, "server exited with error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
