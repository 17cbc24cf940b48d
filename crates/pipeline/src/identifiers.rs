//! Newtype domain identifiers.
//!
//! Every value that identifies something on the remote service is a distinct
//! newtype. This prevents accidentally passing — for example — a [`ProjectId`]
//! where a [`CompileGroup`] is expected, even though both are strings under the
//! hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ResolveError;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Share token
// ---------------------------------------------------------------------------

/// Length of every share token issued by the remote service.
pub const SHARE_TOKEN_LEN: usize = 12;

/// Identifies a read-only shared project.
///
/// The token is the path segment of a public share link
/// (`https://www.overleaf.com/read/{token}`). It is exactly
/// [`SHARE_TOKEN_LEN`] characters of lowercase ASCII letters and digits; any
/// other shape is rejected before a single request is made.
///
/// The token is the correlation key for everything cached about a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShareToken(String);

impl ShareToken {
    /// Validates `value` against the share-token pattern.
    pub fn parse(value: impl Into<String>) -> Result<Self, ResolveError> {
        let v = value.into();
        let well_formed = v.len() == SHARE_TOKEN_LEN
            && v
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
        if well_formed {
            Ok(Self(v))
        } else {
            Err(ResolveError::InvalidTokenFormat)
        }
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShareToken {
    type Error = ResolveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ShareToken> for String {
    fn from(token: ShareToken) -> Self {
        token.0
    }
}

impl std::fmt::Display for ShareToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single invocation of the resolver for one token.
///
/// Generated fresh for every call to `Resolver::resolve`; recorded on the
/// tracing span so all activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolveRunId(Uuid);

impl ResolveRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ResolveRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (assigned by the remote service)
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies the underlying project once read access has been granted.
    ///
    /// Taken from the `/project/{id}` redirect returned by the grant endpoint.
    ProjectId
}

string_id! {
    /// The compile group the remote service scheduled a compile on
    /// (e.g. `"standard"`, `"priority"`).
    CompileGroup
}

string_id! {
    /// Identifies the compile server that holds the output files of a compile.
    ///
    /// Downloads must be routed back to the same server via the
    /// `clsiserverid` query parameter.
    ClsiServerId
}
