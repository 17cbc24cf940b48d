//! Shared value types for the resolve pipeline.
//!
//! Unlike the identifiers in [`crate::identifiers`], these types carry state
//! that flows between stages and invariants that every stage relies on (e.g.
//! a [`SessionState`] never holds an empty CSRF token or cookie).

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ClsiServerId, CompileGroup, ProjectId, ResolveError};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Guest-session credentials threaded through every authenticated stage.
///
/// Produced by the session extractor and handed to each later stage, which
/// returns it (possibly with a rotated cookie). The CSRF token and the cookie
/// are guaranteed non-empty.
///
/// `Debug` redacts both credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionState {
    csrf_token: String,
    session_cookie: String,
    referer_url: String,
}

impl SessionState {
    /// Creates session state, rejecting an empty CSRF token or cookie.
    pub fn new(
        csrf_token: impl Into<String>,
        session_cookie: impl Into<String>,
        referer_url: impl Into<String>,
    ) -> Result<Self, ResolveError> {
        let csrf_token = csrf_token.into();
        let session_cookie = session_cookie.into();
        if csrf_token.is_empty() {
            return Err(ResolveError::CredentialExtraction { field: "csrf" });
        }
        if session_cookie.is_empty() {
            return Err(ResolveError::CredentialExtraction { field: "cookie" });
        }
        Ok(Self {
            csrf_token,
            session_cookie,
            referer_url: referer_url.into(),
        })
    }

    /// The anti-forgery token to send on state-changing requests.
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// The folded `Cookie` header value.
    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    /// The resolved share-page URL, used as `Referer` for the grant call.
    pub fn referer_url(&self) -> &str {
        &self.referer_url
    }

    /// Replaces the cookie with `folded` if it is non-empty.
    ///
    /// Returns `true` if the cookie changed. An empty value keeps the prior
    /// cookie so a stage that sets no cookies never drops the session.
    pub fn rotate_cookie(&mut self, folded: String) -> bool {
        if folded.is_empty() || folded == self.session_cookie {
            return false;
        }
        self.session_cookie = folded;
        true
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("csrf_token", &"<redacted>")
            .field("session_cookie", &"<redacted>")
            .field("referer_url", &self.referer_url)
            .finish()
    }
}

/// Folds raw `Set-Cookie` header values into a single `Cookie` header value.
///
/// Keeps only the `name=value` segment of each cookie (attributes such as
/// `Path` and `HttpOnly` are dropped) and joins them with `;` in the order
/// received. Blank segments are skipped.
pub fn fold_set_cookies<S: AsRef<str>>(set_cookies: &[S]) -> String {
    set_cookies
        .iter()
        .filter_map(|c| c.as_ref().split(';').next())
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(";")
}

// ---------------------------------------------------------------------------
// Project access
// ---------------------------------------------------------------------------

/// The project a share token grants access to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    /// Remote-assigned project identifier.
    pub resource_id: ProjectId,
}

impl ResourceHandle {
    /// Parses a grant redirect of the form `/project/{id}`.
    ///
    /// Returns `None` for any other path, including `/project/` with no id
    /// and ids containing further path segments.
    pub fn from_redirect(redirect: &str) -> Option<Self> {
        let id = redirect.strip_prefix("/project/")?;
        let id = id.split(['?', '#']).next().unwrap_or_default();
        if id.contains('/') {
            return None;
        }
        ProjectId::new(id).map(|resource_id| Self { resource_id })
    }
}

/// Metadata shown alongside the resolved PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Project title; `"Untitled"` when the page does not declare one.
    pub title: String,
}

impl ProjectMetadata {
    /// Title used when the project page carries no title marker.
    pub const UNTITLED: &'static str = "Untitled";
}

// ---------------------------------------------------------------------------
// Compile output
// ---------------------------------------------------------------------------

/// One file produced by a remote compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    /// File type as reported by the compile server (`"pdf"`, `"log"`, ...).
    #[serde(rename = "type")]
    pub file_type: String,
    /// Path of the file relative to the download domain.
    pub url: String,
    /// Output path inside the compile directory, if reported.
    #[serde(default)]
    pub path: Option<String>,
    /// Build identifier, if reported.
    #[serde(default)]
    pub build: Option<String>,
}

impl OutputFile {
    /// Type marker of the rendered document.
    pub const PDF_TYPE: &'static str = "pdf";

    /// Returns `true` if this entry is the rendered PDF.
    pub fn is_pdf(&self) -> bool {
        self.file_type == Self::PDF_TYPE
    }
}

/// The body of a compile response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResult {
    /// Files produced by the compile.
    #[serde(default)]
    pub output_files: Vec<OutputFile>,
    /// Origin that serves the output files, if different from the main site.
    #[serde(default)]
    pub pdf_download_domain: Option<String>,
    /// Compile group the compile ran on.
    #[serde(default)]
    pub compile_group: Option<CompileGroup>,
    /// Compile server holding the output files.
    #[serde(default, rename = "clsiServerId")]
    pub server_id: Option<ClsiServerId>,
    /// Overall compile status (`"success"`, `"failure"`, ...).
    #[serde(default)]
    pub status: Option<String>,
}

impl CompileResult {
    /// Returns the first output file of PDF type.
    pub fn pdf_file(&self) -> Option<&OutputFile> {
        self.output_files.iter().find(|f| f.is_pdf())
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// How a compiled PDF is handed to the caller.
///
/// A deployment picks one strategy; it decides both what the stages produce
/// and what the cache stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStrategy {
    /// Return the download URL; the viewer fetches it with its own session.
    Url,
    /// Download the PDF and return its bytes.
    #[default]
    Bytes,
}

/// Where the CSRF token travels on the compile request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsrfPlacement {
    /// As the `_csrf` field of the JSON body.
    #[default]
    Body,
    /// As the `X-Csrf-Token` request header.
    Header,
}

/// A resolved PDF reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Absolute download URL.
    Url(String),
    /// The PDF itself.
    Bytes(Bytes),
}

impl Artifact {
    /// The strategy that produced this artifact.
    pub fn strategy(&self) -> ArtifactStrategy {
        match self {
            Self::Url(_) => ArtifactStrategy::Url,
            Self::Bytes(_) => ArtifactStrategy::Bytes,
        }
    }
}

/// The result of a successful pipeline run, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// The PDF reference.
    pub artifact: Artifact,
    /// Project title, when metadata loading is enabled.
    pub title: Option<String>,
    /// When the pipeline produced this artifact.
    pub resolved_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Pipeline progress
// ---------------------------------------------------------------------------

/// States of the resolve state machine, in execution order.
///
/// `CacheHit` and `Done` are terminal. Used for progress logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStage {
    CacheHit,
    ExtractSession,
    GrantAccess,
    LoadMetadata,
    Compile,
    ResolveArtifact,
    Done,
}

impl std::fmt::Display for ResolveStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::CacheHit => "cache_hit",
            Self::ExtractSession => "extract_session",
            Self::GrantAccess => "grant_access",
            Self::LoadMetadata => "load_metadata",
            Self::Compile => "compile",
            Self::ResolveArtifact => "resolve_artifact",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}
