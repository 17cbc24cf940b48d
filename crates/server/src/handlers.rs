//! Request handlers.

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pipeline::{Artifact, ResolvedArtifact, ShareToken};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Body returned for the URL strategy.
#[derive(Debug, Serialize)]
pub struct PdfUrlResponse {
    pub pdf: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /resolve/{token}`
///
/// The token is validated before the resolver is consulted, so a malformed
/// token never reaches the cache or the network.
pub async fn resolve(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let token = ShareToken::parse(token)?;
    let resolved = state.resolver.resolve(&token).await?;
    info!(%token, strategy = ?resolved.artifact.strategy(), "resolved");
    Ok(artifact_response(resolved))
}

fn artifact_response(resolved: ResolvedArtifact) -> Response {
    match resolved.artifact {
        Artifact::Url(pdf) => Json(PdfUrlResponse {
            pdf,
            title: resolved.title,
        })
        .into_response(),
        Artifact::Bytes(bytes) => (
            [
                (CONTENT_TYPE, "application/pdf".to_string()),
                (
                    CONTENT_DISPOSITION,
                    inline_disposition(resolved.title.as_deref()),
                ),
            ],
            bytes,
        )
            .into_response(),
    }
}

/// `Content-Disposition` value naming the PDF after the project title.
///
/// Characters outside a conservative ASCII set are replaced so the header
/// value is always valid.
fn inline_disposition(title: Option<&str>) -> String {
    let stem: String = title
        .unwrap_or("document")
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "document" } else { stem.as_str() };
    format!("inline; filename=\"{stem}.pdf\"")
}
