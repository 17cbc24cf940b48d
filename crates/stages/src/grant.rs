use pipeline::{
    fold_set_cookies, RemoteRequest, ResolveError, ResourceHandle, SessionState, ShareToken, Stage,
};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::StageRunner;

impl StageRunner {
    /// Promotes the guest session to read access on the shared project.
    ///
    /// The grant endpoint answers with `{"redirect": "/project/{id}"}`; any
    /// other body is an [`ResolveError::AccessGrant`]. Cookies set by the
    /// response replace the session cookie; without them the prior cookie is
    /// kept.
    #[instrument(skip_all, fields(%token))]
    pub async fn grant_access(
        &self,
        token: &ShareToken,
        mut session: SessionState,
    ) -> Result<(ResourceHandle, SessionState), ResolveError> {
        let request = RemoteRequest::post_json(
            self.endpoints.grant(token),
            json!({ "_csrf": session.csrf_token() }),
        )
        .header("Accept", "application/json")
        .header("Cookie", session.session_cookie())
        .header("Referer", session.referer_url());

        let response = self.send(Stage::Grant, request).await?;

        let handle = response
            .json()
            .and_then(|body| {
                body.get("redirect")?
                    .as_str()
                    .and_then(ResourceHandle::from_redirect)
            })
            .ok_or(ResolveError::AccessGrant {
                status: response.status,
            })?;

        if session.rotate_cookie(fold_set_cookies(&response.set_cookies)) {
            debug!("grant rotated the session cookie");
        }

        info!(project = %handle.resource_id, "read access granted");
        Ok((handle, session))
    }
}
