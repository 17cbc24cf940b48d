//! Overleaf viewer entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: load the layered [`config::AppConfig`] and
//!    validate it.
//! 2. **Wire observability**: install `tracing-subscriber` with a text or JSON
//!    layer and an optional OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: create the `ReqwestTransport`, the markup
//!    extractor, and the artifact cache, and inject them into a
//!    [`stages::Resolver`].
//! 4. **Run a command**:
//!    - `serve`: expose `GET /resolve/{token}` over HTTP.
//!    - `fetch <token>`: resolve one token and write the PDF to disk, or print
//!      its URL.

mod config;
mod telemetry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use overleaf::ReqwestTransport;
use pipeline::{Artifact, ArtifactCache, ArtifactStrategy, RegexExtractor, ShareToken};
use server::AppState;
use stages::{Endpoints, Resolver, ResolverOptions, StageRunner};

use crate::config::AppConfig;

/// How often the serve loop drops expired cache entries.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Resolve Overleaf share links to their compiled PDF
#[derive(Parser, Debug)]
#[command(name = "ol-viewer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "VIEWER_CONFIG",
        default_value = "config/viewer.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the resolve endpoint over HTTP
    Serve {
        /// Listen address, overriding `server.bind`
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Resolve a single share token
    Fetch {
        /// Read-only share token (12 lowercase letters or digits)
        token: String,
        /// Where to write the PDF; defaults to `<title or token>.pdf`
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the PDF URL instead of downloading it
        #[arg(long)]
        url: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;
    let telemetry = telemetry::init(&config.telemetry)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %cli.config.display(),
        "overleaf viewer starting"
    );

    let result = match cli.command {
        Command::Serve { bind } => serve(&config, bind).await,
        Command::Fetch { token, output, url } => fetch(&config, token, output, url).await,
    };

    telemetry.shutdown();
    result
}

fn build_resolver(config: &AppConfig, options: ResolverOptions) -> Result<Resolver> {
    let transport =
        ReqwestTransport::new(&config.remote).context("failed to build remote transport")?;
    let runner = StageRunner::new(
        Arc::new(transport),
        Arc::new(RegexExtractor::new()),
        Endpoints::new(config.remote.base_url.clone()),
    );
    let cache = Arc::new(ArtifactCache::new(config.cache.ttl()));
    Ok(Resolver::new(runner, cache, options))
}

async fn serve(config: &AppConfig, bind: Option<SocketAddr>) -> Result<()> {
    let options = config.pipeline.resolver_options();
    let resolver = Arc::new(build_resolver(config, options)?);
    tracing::info!(
        strategy = ?options.strategy,
        csrf_placement = ?options.csrf_placement,
        load_metadata = options.load_metadata,
        ttl_secs = config.cache.ttl_secs,
        "resolver ready"
    );

    let cache = resolver.cache().clone();
    let purger = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, remaining = cache.len(), "expired artifacts purged");
            }
        }
    });

    let addr = bind.unwrap_or(config.server.bind);
    let result = server::serve(addr, AppState::new(resolver))
        .await
        .with_context(|| format!("server on {addr} failed"));
    purger.abort();
    result
}

async fn fetch(
    config: &AppConfig,
    token: String,
    output: Option<PathBuf>,
    url_only: bool,
) -> Result<()> {
    let token = ShareToken::parse(token)?;
    let mut options = config.pipeline.resolver_options();
    options.strategy = if url_only {
        ArtifactStrategy::Url
    } else {
        ArtifactStrategy::Bytes
    };

    let resolver = build_resolver(config, options)?;
    let resolved = resolver.resolve(&token).await?;

    match resolved.artifact {
        Artifact::Url(url) => println!("{url}"),
        Artifact::Bytes(bytes) => {
            let path = output.unwrap_or_else(|| {
                let stem: String = resolved
                    .title
                    .as_deref()
                    .unwrap_or(token.as_str())
                    .chars()
                    .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
                    .collect();
                PathBuf::from(format!("{stem}.pdf"))
            });
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "pdf written");
        }
    }
    Ok(())
}
