//! Port traits implemented by infrastructure crates.
//!
//! The pipeline needs exactly two things from the outside world: a way to
//! perform one HTTP round-trip ([`RemoteTransport`]) and a way to pull named
//! fields out of page markup ([`CredentialExtractor`]). Both are object-safe so
//! the orchestrator can hold them as `Arc<dyn ...>` and tests can substitute
//! scripted fakes.

use async_trait::async_trait;
use bytes::Bytes;

use crate::TransportError;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// HTTP method of a [`RemoteRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A single request to the remote service.
///
/// Browser-identity headers (`User-Agent`, `Origin`) are the transport's
/// concern; `headers` carries only what a stage adds (`Cookie`, `Referer`,
/// `Accept`, CSRF header).
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// JSON body, sent with `Content-Type: application/json`.
    pub json_body: Option<serde_json::Value>,
}

impl RemoteRequest {
    /// A `GET` request with no headers.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            json_body: None,
        }
    }

    /// A `POST` request carrying `body` as JSON.
    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: Vec::new(),
            json_body: Some(body),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first value of header `name` (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The response to a [`RemoteRequest`], after redirects have been followed.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    /// Final HTTP status.
    pub status: u16,
    /// URL of the final response after redirects.
    pub final_url: String,
    /// Raw `Set-Cookie` header values of the final response, in order.
    pub set_cookies: Vec<String>,
    /// Response body.
    pub body: Bytes,
}

impl RemoteResponse {
    /// Returns `true` if the status is exactly `200 OK`.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Returns `true` for any `2xx` status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The body parsed as JSON, or `None` if it is not valid JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Performs HTTP round-trips against the remote service.
///
/// Implementations must follow redirects, apply their own timeouts, and must
/// **not** keep a cookie jar: cookies are managed explicitly by the stages
/// through [`crate::SessionState`].
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Sends `request` and returns the final response.
    ///
    /// Non-success statuses are returned as `Ok`; only failures that produced
    /// no response at all are errors.
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// Markup extraction
// ---------------------------------------------------------------------------

/// Extracts named fields from semi-structured page markup.
///
/// Isolates the scraping strategy from the pipeline: swapping pattern matching
/// for a real HTML parser only means providing another implementation.
pub trait CredentialExtractor: Send + Sync {
    /// The CSRF token declared by the page, if present and non-empty.
    fn csrf_token(&self, page: &str) -> Option<String>;

    /// The project title declared by the page, if present and non-empty.
    fn project_title(&self, page: &str) -> Option<String>;
}
