use pipeline::{
    fold_set_cookies, ProjectMetadata, RemoteRequest, ResolveError, ResourceHandle, SessionState,
    Stage,
};
use tracing::{debug, instrument};

use crate::StageRunner;

impl StageRunner {
    /// Loads the project page and reads the project title from it.
    ///
    /// A page without a title marker yields [`ProjectMetadata::UNTITLED`].
    #[instrument(skip_all, fields(project = %resource.resource_id))]
    pub async fn load_metadata(
        &self,
        resource: &ResourceHandle,
        mut session: SessionState,
    ) -> Result<(ProjectMetadata, SessionState), ResolveError> {
        let request = RemoteRequest::get(self.endpoints.project_page(&resource.resource_id))
            .header("Cookie", session.session_cookie())
            .header("Referer", session.referer_url());

        let response = self.send(Stage::Metadata, request).await?;
        if !response.is_ok() {
            return Err(ResolveError::RemoteFetch {
                stage: Stage::Metadata,
                status: response.status,
            });
        }

        let title = self
            .extractor
            .project_title(&response.text())
            .unwrap_or_else(|| ProjectMetadata::UNTITLED.to_string());
        session.rotate_cookie(fold_set_cookies(&response.set_cookies));

        debug!(%title, "project metadata loaded");
        Ok((ProjectMetadata { title }, session))
    }
}
