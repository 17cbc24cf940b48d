//! Layered application configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults (every field has one).
//! 2. A TOML file, `config/viewer.toml` unless `--config` names another. A
//!    missing file is not an error.
//! 3. Environment variables prefixed `VIEWER_`, with `__` separating sections,
//!    e.g. `VIEWER_PIPELINE__STRATEGY=url`.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use overleaf::{RemoteConfig, SetupError};
use pipeline::{ArtifactStrategy, CsrfPlacement, DEFAULT_TTL};
use serde::{Deserialize, Serialize};
use stages::ResolverOptions;
use thiserror::Error;

pub const ENV_PREFIX: &str = "VIEWER_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a resolved artifact, in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub strategy: ArtifactStrategy,
    pub csrf_placement: CsrfPlacement,
    /// Run the metadata stage to learn the project title.
    pub load_metadata: bool,
}

impl PipelineConfig {
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            strategy: self.strategy,
            csrf_placement: self.csrf_placement,
            load_metadata: self.load_metadata,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Emit log lines as JSON objects instead of human-readable text.
    pub json_logs: bool,
    /// OTLP/gRPC collector endpoint. Span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("cache.ttl_secs must be greater than zero")]
    ZeroTtl,

    #[error("invalid remote settings: {0}")]
    Remote(#[from] SetupError),
}

impl AppConfig {
    /// Loads and validates the configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment(path).extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl);
        }
        self.remote.validate()?;
        Ok(())
    }
}
