//! Scripted in-memory remote service for pipeline tests.

#![allow(dead_code)] // Each test binary uses a different subset of helpers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use pipeline::{
    ArtifactCache, HttpMethod, RegexExtractor, RemoteRequest, RemoteResponse, RemoteTransport,
    TransportError, DEFAULT_TTL,
};
use serde_json::{json, Value};
use stages::{Endpoints, Resolver, ResolverOptions, StageRunner};

pub const BASE: &str = "https://www.overleaf.com";
pub const TOKEN: &str = "abcd1234efgh";
pub const CLSI: &str = "https://clsi.example.com";
pub const PDF_URL: &str = "https://clsi.example.com/out.pdf?compileGroup=standard&clsiserverid=clsi-1&enable_pdf_caching=true";
pub const PDF_BYTES: &[u8] = b"%PDF-1.5 fake";

pub fn share_page_url(token: &str) -> String {
    format!("{BASE}/read/{token}")
}

pub fn grant_url(token: &str) -> String {
    format!("{BASE}/read/{token}/grant")
}

pub fn project_url(project: &str) -> String {
    format!("{BASE}/project/{project}")
}

pub fn compile_url(project: &str) -> String {
    format!("{BASE}/project/{project}/compile?auto_compile=true")
}

pub fn share_page_html(csrf: &str, title: &str) -> String {
    format!(
        "<html><head>\n<meta name=\"og:title\" content=\"{title}\">\n\
         <meta name=\"ol-csrfToken\" content=\"{csrf}\">\n</head><body></body></html>"
    )
}

struct Route {
    method: HttpMethod,
    url: String,
    reply: Result<RemoteResponse, TransportError>,
    delay: Option<Duration>,
}

/// A fake remote service that answers from a fixed routing table and records
/// every request it receives.
#[derive(Default)]
pub struct FakeRemote {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<RemoteRequest>>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, method: HttpMethod, url: impl Into<String>, reply: RemoteResponse) {
        self.add(method, url.into(), Ok(reply), None);
    }

    pub fn route_delayed(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        reply: RemoteResponse,
        delay: Duration,
    ) {
        self.add(method, url.into(), Ok(reply), Some(delay));
    }

    pub fn route_error(&self, method: HttpMethod, url: impl Into<String>, error: TransportError) {
        self.add(method, url.into(), Err(error), None);
    }

    fn add(
        &self,
        method: HttpMethod,
        url: String,
        reply: Result<RemoteResponse, TransportError>,
        delay: Option<Duration>,
    ) {
        let mut routes = self.routes.lock().unwrap();
        routes.retain(|r| !(r.method == method && r.url == url));
        routes.push(Route {
            method,
            url,
            reply,
            delay,
        });
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RemoteRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests whose URL equals `url`.
    pub fn requests_to(&self, url: &str) -> Vec<RemoteRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }
}

#[async_trait]
impl RemoteTransport for FakeRemote {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let matched = {
            let routes = self.routes.lock().unwrap();
            routes
                .iter()
                .find(|r| r.method == request.method && r.url == request.url)
                .map(|r| (r.reply.clone(), r.delay))
        };
        match matched {
            Some((reply, delay)) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                reply
            }
            None => Ok(response(404, &request.url, Vec::new(), "not found")),
        }
    }
}

pub fn response(status: u16, url: &str, cookies: Vec<&str>, body: impl Into<Bytes>) -> RemoteResponse {
    RemoteResponse {
        status,
        final_url: url.to_string(),
        set_cookies: cookies.into_iter().map(str::to_string).collect(),
        body: body.into(),
    }
}

pub fn json_response(status: u16, url: &str, cookies: Vec<&str>, body: Value) -> RemoteResponse {
    response(status, url, cookies, serde_json::to_vec(&body).unwrap())
}

pub fn compile_body() -> Value {
    json!({
        "status": "success",
        "outputFiles": [
            { "path": "output.log", "url": "/out.log", "type": "log" },
            { "path": "output.pdf", "url": "/out.pdf", "type": "pdf" }
        ],
        "pdfDownloadDomain": CLSI,
        "compileGroup": "standard",
        "clsiServerId": "clsi-1"
    })
}

/// Routes the complete happy path for `TOKEN`: share page (CSRF `csrf-xyz`,
/// cookie `sess=1`), grant to project `p42`, project page, compile, and PDF.
pub fn happy_path(remote: &FakeRemote) {
    remote.route(
        HttpMethod::Get,
        share_page_url(TOKEN),
        response(
            200,
            &share_page_url(TOKEN),
            vec!["sess=1; Path=/; HttpOnly"],
            share_page_html("csrf-xyz", "My Thesis"),
        ),
    );
    remote.route(
        HttpMethod::Post,
        grant_url(TOKEN),
        json_response(200, &grant_url(TOKEN), vec![], json!({ "redirect": "/project/p42" })),
    );
    remote.route(
        HttpMethod::Get,
        project_url("p42"),
        response(
            200,
            &project_url("p42"),
            vec![],
            share_page_html("csrf-xyz", "My Thesis"),
        ),
    );
    remote.route(
        HttpMethod::Post,
        compile_url("p42"),
        json_response(200, &compile_url("p42"), vec![], compile_body()),
    );
    remote.route(
        HttpMethod::Get,
        PDF_URL,
        response(200, PDF_URL, vec![], Bytes::from_static(PDF_BYTES)),
    );
}

pub fn resolver_with(remote: Arc<FakeRemote>, options: ResolverOptions) -> Resolver {
    resolver_with_cache(remote, options, Arc::new(ArtifactCache::new(DEFAULT_TTL)))
}

pub fn resolver_with_cache(
    remote: Arc<FakeRemote>,
    options: ResolverOptions,
    cache: Arc<ArtifactCache>,
) -> Resolver {
    let runner = StageRunner::new(remote, Arc::new(RegexExtractor::new()), Endpoints::new(BASE));
    Resolver::new(runner, cache, options)
}

pub fn url_options() -> ResolverOptions {
    ResolverOptions {
        strategy: pipeline::ArtifactStrategy::Url,
        ..ResolverOptions::default()
    }
}

pub fn bytes_options() -> ResolverOptions {
    ResolverOptions {
        strategy: pipeline::ArtifactStrategy::Bytes,
        ..ResolverOptions::default()
    }
}
