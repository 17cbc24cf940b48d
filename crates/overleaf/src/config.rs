use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Browser identity presented to the remote service.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:114.0) Gecko/20100101 Firefox/114.0";

/// Connection settings for the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Origin of the remote service (e.g. `https://www.overleaf.com`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// `User-Agent` sent on every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// `Origin` sent on every request. Defaults to `base_url` when unset.
    #[serde(default)]
    pub origin: Option<String>,
    /// Upper bound on one complete request, including the body, in seconds.
    ///
    /// Compiles of large projects routinely take tens of seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound on establishing a connection, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Maximum number of redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_base_url() -> String {
    "https://www.overleaf.com".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    10
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            origin: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl RemoteConfig {
    /// Checks that the settings can produce a working client.
    pub fn validate(&self) -> Result<(), SetupError> {
        let url = Url::parse(&self.base_url).map_err(|e| SetupError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SetupError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(SetupError::ZeroTimeout {
                field: "request_timeout_secs",
            });
        }
        if self.connect_timeout_secs == 0 {
            return Err(SetupError::ZeroTimeout {
                field: "connect_timeout_secs",
            });
        }
        Ok(())
    }

    /// The `Origin` header value.
    pub fn origin(&self) -> &str {
        self.origin
            .as_deref()
            .unwrap_or_else(|| self.base_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Errors raised while building the transport.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("invalid value for header {name}")]
    InvalidHeader { name: &'static str },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
