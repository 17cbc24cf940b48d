use pipeline::{
    fold_set_cookies, CompileFailure, CompileResult, CsrfPlacement, RemoteRequest, ResolveError,
    ResourceHandle, SessionState, Stage,
};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::StageRunner;

/// Header carrying the CSRF token when [`CsrfPlacement::Header`] is selected.
pub(crate) const CSRF_HEADER: &str = "X-Csrf-Token";

impl StageRunner {
    /// Triggers a remote compile of the project.
    ///
    /// Always requests a final (non-draft), silently checked, full compile of
    /// the project's configured root document. A non-success status is
    /// reported as [`CompileFailure::Rejected`]; a successful response without
    /// output files as [`CompileFailure::NoOutput`], which usually means the
    /// document itself failed to build.
    #[instrument(skip_all, fields(project = %resource.resource_id))]
    pub async fn compile(
        &self,
        resource: &ResourceHandle,
        mut session: SessionState,
        placement: CsrfPlacement,
    ) -> Result<(CompileResult, SessionState), ResolveError> {
        let mut body = json!({
            "rootDoc_id": null,
            "draft": false,
            "check": "silent",
            "incrementalCompilesEnabled": false,
        });
        if placement == CsrfPlacement::Body {
            body["_csrf"] = json!(session.csrf_token());
        }

        let mut request = RemoteRequest::post_json(self.endpoints.compile(&resource.resource_id), body)
            .header("Accept", "application/json")
            .header("Cookie", session.session_cookie())
            .header("Referer", self.endpoints.project_page(&resource.resource_id));
        if placement == CsrfPlacement::Header {
            request = request.header(CSRF_HEADER, session.csrf_token());
        }

        let response = self.send(Stage::Compile, request).await?;
        if !response.is_success() {
            warn!(status = response.status, "compile request rejected");
            return Err(ResolveError::Compile {
                status: response.status,
                failure: CompileFailure::Rejected,
            });
        }

        let result = serde_json::from_slice::<CompileResult>(&response.body).ok();
        let result = match result {
            Some(r) if !r.output_files.is_empty() => r,
            other => {
                let compile_status = other.and_then(|r| r.status);
                warn!(
                    status = response.status,
                    compile_status = compile_status.as_deref().unwrap_or("<none>"),
                    "compile finished without output files"
                );
                return Err(ResolveError::Compile {
                    status: response.status,
                    failure: CompileFailure::NoOutput { compile_status },
                });
            }
        };

        session.rotate_cookie(fold_set_cookies(&response.set_cookies));

        info!(
            files = result.output_files.len(),
            compile_status = result.status.as_deref().unwrap_or("<none>"),
            "compile finished"
        );
        Ok((result, session))
    }
}
