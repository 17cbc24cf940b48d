//! Core domain for the shared-project PDF resolver.
//!
//! This crate contains every domain concept, newtype identifier, value type,
//! and error used throughout the workspace, plus the port traits the
//! infrastructure crates implement. It defines *what* a resolve needs; the
//! `overleaf` crate defines *how* requests reach the remote service.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | `ShareToken` validation and remote-assigned ids |
//! | [`types`] | `SessionState`, compile output, artifacts, strategies |
//! | [`errors`] | `ResolveError` taxonomy and `TransportError` |
//! | [`ports`] | `RemoteTransport` and `CredentialExtractor` traits |
//! | [`extract`] | Regex-based markup extraction |
//! | [`cache`] | `TtlCache` and the `ArtifactCache` alias |

pub mod cache;
pub mod errors;
pub mod extract;
pub mod identifiers;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use cache::{ArtifactCache, TtlCache, DEFAULT_TTL};
pub use errors::{CompileFailure, ResolveError, Stage, TransportError};
pub use extract::RegexExtractor;
pub use identifiers::{ClsiServerId, CompileGroup, ProjectId, ResolveRunId, ShareToken, SHARE_TOKEN_LEN};
pub use ports::{CredentialExtractor, HttpMethod, RemoteRequest, RemoteResponse, RemoteTransport};
pub use types::{
    fold_set_cookies, Artifact, ArtifactStrategy, CompileResult, CsrfPlacement, OutputFile,
    ProjectMetadata, ResolveStage, ResolvedArtifact, ResourceHandle, SessionState,
};
