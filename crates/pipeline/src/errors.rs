//! Error taxonomy for the resolve pipeline.
//!
//! Every variant of [`ResolveError`] is fatal to the current invocation: the
//! orchestrator never retries and never continues with a partial result. Each
//! variant knows its machine-readable [`kind`](ResolveError::kind) and, where
//! the remote service supplied one, the HTTP [`status`](ResolveError::status)
//! that the boundary should report.
//!
//! Messages never contain credentials. The CSRF token and session cookie are
//! deliberately absent from every variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Stage labels
// ---------------------------------------------------------------------------

/// A remote round-trip performed by the pipeline.
///
/// Used to label errors that can occur in more than one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching the public share page.
    Read,
    /// Exchanging the guest session for project access.
    Grant,
    /// Loading project metadata.
    Metadata,
    /// Triggering the remote compile.
    Compile,
    /// Downloading the rendered PDF.
    Download,
}

impl Stage {
    /// Returns the lowercase label used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Grant => "grant",
            Self::Metadata => "metadata",
            Self::Compile => "compile",
            Self::Download => "download",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Compile failures
// ---------------------------------------------------------------------------

/// Why a compile did not yield usable output.
///
/// A rejected request and a compile that ran but produced nothing are
/// different problems: the first points at the session or the service, the
/// second usually at an error inside the document itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum CompileFailure {
    /// The compile endpoint answered with a non-success HTTP status.
    Rejected,
    /// The endpoint answered successfully but listed no output files.
    NoOutput {
        /// The `status` field of the compile response, if present
        /// (e.g. `"failure"`, `"timedout"`).
        compile_status: Option<String>,
    },
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected => f.write_str("request rejected"),
            Self::NoOutput {
                compile_status: Some(s),
            } => write!(f, "no output files (compile status '{s}')"),
            Self::NoOutput {
                compile_status: None,
            } => f.write_str("no output files"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline errors
// ---------------------------------------------------------------------------

/// Errors that abort a resolve invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The share token failed the lexical check; the pipeline never started.
    #[error("Invalid token format")]
    InvalidTokenFormat,

    /// A page fetch did not return the success status.
    ///
    /// For the `read` stage this usually means the token is invalid or the
    /// share link has been disabled.
    #[error("Remote fetch failed at stage '{stage}' with status {status}")]
    RemoteFetch {
        /// The stage whose fetch failed.
        stage: Stage,
        /// HTTP status returned by the remote service.
        status: u16,
    },

    /// An expected session marker was absent from a successful response.
    ///
    /// Signals that the remote markup has changed.
    #[error("Could not extract '{field}' from the share page")]
    CredentialExtraction {
        /// The missing field (`"csrf"` or `"cookie"`).
        field: &'static str,
    },

    /// The grant endpoint did not redirect to a project.
    ///
    /// The token may lack read access, or link sharing was disabled.
    #[error("Access grant failed with status {status}")]
    AccessGrant {
        /// HTTP status returned by the grant endpoint.
        status: u16,
    },

    /// The compile endpoint failed or returned no output files.
    #[error("Compilation failed or incomplete ({failure}) with status {status}")]
    Compile {
        /// HTTP status returned by the compile endpoint.
        status: u16,
        /// Whether the request was rejected or the compile produced nothing.
        failure: CompileFailure,
    },

    /// The compile succeeded but listed no PDF among its output files.
    #[error("PDF file not found in output files")]
    ArtifactNotFound,

    /// The PDF download did not return the success status.
    #[error("PDF download failed with status {status}")]
    ArtifactDownload {
        /// HTTP status returned by the download server.
        status: u16,
    },

    /// A request never produced a response (timeout, DNS, TLS, connection reset).
    #[error("Request to the remote service failed at stage '{stage}': {message}")]
    Transport {
        /// The stage whose request failed.
        stage: Stage,
        /// Transport-level description; never contains credentials.
        message: String,
    },
}

impl ResolveError {
    /// Machine-readable error kind reported at the boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTokenFormat => "invalid_token_format",
            Self::RemoteFetch { .. } => "remote_fetch",
            Self::CredentialExtraction { .. } => "credential_extraction",
            Self::AccessGrant { .. } => "access_grant",
            Self::Compile { .. } => "compile",
            Self::ArtifactNotFound => "artifact_not_found",
            Self::ArtifactDownload { .. } => "artifact_download",
            Self::Transport { .. } => "transport",
        }
    }

    /// HTTP status carried by the failing stage, if it specified one.
    ///
    /// `None` means the boundary should fall back to a generic server error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidTokenFormat => Some(400),
            Self::RemoteFetch { status, .. }
            | Self::AccessGrant { status }
            | Self::Compile { status, .. }
            | Self::ArtifactDownload { status } => Some(*status),
            Self::CredentialExtraction { .. } | Self::ArtifactNotFound | Self::Transport { .. } => {
                None
            }
        }
    }
}

/// A transport-level failure reported by a [`crate::RemoteTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Human-readable description of the failure.
    pub message: String,
    /// `true` if the request exceeded its timeout.
    pub timed_out: bool,
}

impl TransportError {
    /// Creates a [`TransportError`] that is not a timeout.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Attributes this failure to `stage`, producing the pipeline error.
    pub fn at(self, stage: Stage) -> ResolveError {
        let message = if self.timed_out {
            format!("timed out: {}", self.message)
        } else {
            self.message
        };
        ResolveError::Transport { stage, message }
    }
}
