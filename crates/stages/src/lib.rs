//! Resolve pipeline stages and the orchestrating [`Resolver`].
//!
//! Each stage is one remote round-trip implemented as a method on
//! [`StageRunner`]. Stages take the current [`pipeline::SessionState`] by value
//! and hand it back, possibly with a rotated cookie, so the data dependency
//! between stages is explicit in every signature.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Stages sequence calls between the domain types in
//! [`pipeline`] and the [`pipeline::RemoteTransport`] port. They contain no
//! transport details of their own.
//!
//! ## Stage order
//!
//! | Stage | Method | Remote call |
//! |-------|--------|-------------|
//! | Extract session | [`StageRunner::extract_session`] | `GET /read/{token}` |
//! | Grant access | [`StageRunner::grant_access`] | `POST /read/{token}/grant` |
//! | Load metadata (optional) | [`StageRunner::load_metadata`] | `GET /project/{id}` |
//! | Compile | [`StageRunner::compile`] | `POST /project/{id}/compile` |
//! | Resolve artifact | [`StageRunner::resolve_artifact`] | `GET {pdf url}` (byte strategy only) |

mod artifact;
mod compile;
mod endpoints;
mod grant;
mod inflight;
mod metadata;
mod resolver;
mod runner;
mod session;

pub use artifact::compose_pdf_url;
pub use endpoints::Endpoints;
pub use resolver::{Resolver, ResolverOptions};
pub use runner::StageRunner;
