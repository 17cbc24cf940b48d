//! Boundary error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pipeline::ResolveError;
use serde::Serialize;
use tracing::debug;

/// JSON body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Error kind for programmatic handling.
    pub kind: &'static str,
}

/// A pipeline failure rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ResolveError);

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code reported to the caller.
    ///
    /// Uses the status carried by the failing stage. Stages that carry none
    /// map to `500`; a carried status that is not an error status (a grant
    /// answering `200` without a redirect, for example) maps to `502`.
    pub fn status_code(&self) -> StatusCode {
        match self.0.status() {
            None => StatusCode::INTERNAL_SERVER_ERROR,
            Some(status) if status < 400 => StatusCode::BAD_GATEWAY,
            Some(status) => {
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        debug!(kind = self.0.kind(), %status, "responding with error");
        let body = ErrorResponse {
            error: self.0.to_string(),
            kind: self.0.kind(),
        };
        (status, Json(body)).into_response()
    }
}
