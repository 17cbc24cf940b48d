//! Remote-service transport adapter.
//!
//! Implements the [`pipeline::RemoteTransport`] trait over `reqwest`. Stages
//! in the `stages` crate describe *which* requests to make; this crate decides
//! *how* they travel.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Browser identity headers, TLS, redirect policy,
//! connect/request timeouts, and `Set-Cookie` capture all live here. The
//! [`pipeline`] crate sees only [`pipeline::RemoteTransport`].
//!
//! ## Cookies
//!
//! The client deliberately has no cookie store. Session cookies rotate between
//! stages and the pipeline models that rotation explicitly, so the transport
//! returns raw `Set-Cookie` values and sends exactly the `Cookie` header the
//! stage provides.

mod config;
mod transport;

pub use config::{RemoteConfig, SetupError, DEFAULT_USER_AGENT};
pub use transport::ReqwestTransport;
