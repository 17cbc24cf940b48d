use std::sync::Arc;

use pipeline::{
    CredentialExtractor, RemoteRequest, RemoteResponse, RemoteTransport, ResolveError, Stage,
};
use tracing::debug;

use crate::Endpoints;

/// Executes individual pipeline stages against the remote service.
///
/// Holds the transport, the markup extractor, and the endpoint templates. The
/// stage methods live in their own modules (`session`, `grant`, `metadata`,
/// `compile`, `artifact`).
#[derive(Clone)]
pub struct StageRunner {
    pub(crate) transport: Arc<dyn RemoteTransport>,
    pub(crate) extractor: Arc<dyn CredentialExtractor>,
    pub(crate) endpoints: Endpoints,
}

impl StageRunner {
    pub fn new(
        transport: Arc<dyn RemoteTransport>,
        extractor: Arc<dyn CredentialExtractor>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            transport,
            extractor,
            endpoints,
        }
    }

    /// Sends one request, attributing transport failures to `stage`.
    pub(crate) async fn send(
        &self,
        stage: Stage,
        request: RemoteRequest,
    ) -> Result<RemoteResponse, ResolveError> {
        debug!(%stage, method = ?request.method, url = %request.url, "sending request");
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| e.at(stage))?;
        debug!(%stage, status = response.status, "received response");
        Ok(response)
    }
}
