use pipeline::{ProjectId, ShareToken};

/// Default origin of the remote service.
pub const DEFAULT_BASE_URL: &str = "https://www.overleaf.com";

/// URL templates of the remote service, rooted at a configurable origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    /// Creates endpoints rooted at `base_url`. A trailing `/` is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The public share page.
    pub fn share_page(&self, token: &ShareToken) -> String {
        format!("{}/read/{}", self.base_url, token)
    }

    /// The endpoint that exchanges a guest session for read access.
    pub fn grant(&self, token: &ShareToken) -> String {
        format!("{}/read/{}/grant", self.base_url, token)
    }

    /// The canonical project page; also the `Referer` of compile requests.
    pub fn project_page(&self, project: &ProjectId) -> String {
        format!("{}/project/{}", self.base_url, project)
    }

    /// The compile endpoint of a project.
    pub fn compile(&self, project: &ProjectId) -> String {
        format!("{}/project/{}/compile?auto_compile=true", self.base_url, project)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
