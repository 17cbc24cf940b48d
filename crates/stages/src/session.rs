use pipeline::{fold_set_cookies, RemoteRequest, ResolveError, SessionState, ShareToken, Stage};
use tracing::{info, instrument};

use crate::StageRunner;

impl StageRunner {
    /// Opens a guest session by fetching the public share page.
    ///
    /// The page must answer exactly `200`. The CSRF token comes from the page
    /// markup, the cookie from every `Set-Cookie` of the response, and the
    /// final URL after redirects becomes the referer for the grant call.
    #[instrument(skip_all, fields(%token))]
    pub async fn extract_session(&self, token: &ShareToken) -> Result<SessionState, ResolveError> {
        let response = self
            .send(Stage::Read, RemoteRequest::get(self.endpoints.share_page(token)))
            .await?;
        if !response.is_ok() {
            return Err(ResolveError::RemoteFetch {
                stage: Stage::Read,
                status: response.status,
            });
        }

        let csrf = self
            .extractor
            .csrf_token(&response.text())
            .ok_or(ResolveError::CredentialExtraction { field: "csrf" })?;
        let cookie = fold_set_cookies(&response.set_cookies);
        let session = SessionState::new(csrf, cookie, response.final_url)?;

        info!(
            cookie_len = session.session_cookie().len(),
            referer = session.referer_url(),
            "guest session established"
        );
        Ok(session)
    }
}
