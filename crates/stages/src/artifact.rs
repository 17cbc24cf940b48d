use pipeline::{
    Artifact, ArtifactStrategy, CompileResult, OutputFile, RemoteRequest, ResolveError,
    SessionState, Stage,
};
use tracing::{info, instrument};
use urlencoding::encode;

use crate::StageRunner;

/// Builds the download URL of `file`.
///
/// The URL is rooted at the compile's `pdfDownloadDomain` (or `fallback_origin`
/// when the response did not name one) and carries the routing parameters the
/// download server needs to find the output: the compile group, the compile
/// server id, and the caching hint.
pub fn compose_pdf_url(result: &CompileResult, file: &OutputFile, fallback_origin: &str) -> String {
    let origin = result
        .pdf_download_domain
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(fallback_origin)
        .trim_end_matches('/');

    let mut url = String::with_capacity(origin.len() + file.url.len() + 96);
    url.push_str(origin);
    if !file.url.starts_with('/') {
        url.push('/');
    }
    url.push_str(&file.url);

    let mut params = Vec::with_capacity(3);
    if let Some(group) = &result.compile_group {
        params.push(format!("compileGroup={}", encode(group.as_str())));
    }
    if let Some(server) = &result.server_id {
        params.push(format!("clsiserverid={}", encode(server.as_str())));
    }
    params.push("enable_pdf_caching=true".to_string());

    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(&params.join("&"));
    url
}

impl StageRunner {
    /// Resolves the compiled PDF according to `strategy`.
    ///
    /// With [`ArtifactStrategy::Url`] no request is made. With
    /// [`ArtifactStrategy::Bytes`] the PDF is downloaded using the session
    /// cookie and must answer exactly `200`.
    #[instrument(skip_all, fields(?strategy))]
    pub async fn resolve_artifact(
        &self,
        result: &CompileResult,
        session: &SessionState,
        strategy: ArtifactStrategy,
    ) -> Result<Artifact, ResolveError> {
        let file = result.pdf_file().ok_or(ResolveError::ArtifactNotFound)?;
        let url = compose_pdf_url(result, file, self.endpoints.base_url());

        match strategy {
            ArtifactStrategy::Url => {
                info!(%url, "pdf url resolved");
                Ok(Artifact::Url(url))
            }
            ArtifactStrategy::Bytes => {
                let request = RemoteRequest::get(url).header("Cookie", session.session_cookie());
                let response = self.send(Stage::Download, request).await?;
                if !response.is_ok() {
                    return Err(ResolveError::ArtifactDownload {
                        status: response.status,
                    });
                }
                info!(bytes = response.body.len(), "pdf downloaded");
                Ok(Artifact::Bytes(response.body))
            }
        }
    }
}
