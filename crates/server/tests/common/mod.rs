#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use pipeline::{
    ArtifactCache, ArtifactStrategy, HttpMethod, RegexExtractor, RemoteRequest, RemoteResponse,
    RemoteTransport, TransportError, DEFAULT_TTL,
};
use serde_json::{json, Value};
use server::{create_router, AppState};
use stages::{Endpoints, Resolver, ResolverOptions, StageRunner};
use tower::ServiceExt;

pub const BASE: &str = "https://www.overleaf.com";
pub const TOKEN: &str = "abcd1234efgh";
pub const PDF_URL: &str = "https://clsi.example.com/out.pdf?compileGroup=standard&clsiserverid=clsi-1&enable_pdf_caching=true";
pub const PDF_BYTES: &[u8] = b"%PDF-1.5 fake";

/// Remote service stub: fixed replies keyed by method and URL, 404 otherwise.
#[derive(Default)]
pub struct StubRemote {
    replies: Mutex<HashMap<(String, String), RemoteResponse>>,
    calls: AtomicUsize,
}

impl StubRemote {
    pub fn reply(&self, method: HttpMethod, url: &str, status: u16, cookies: &[&str], body: impl Into<Bytes>) {
        self.replies.lock().unwrap().insert(
            (format!("{method:?}"), url.to_string()),
            RemoteResponse {
                status,
                final_url: url.to_string(),
                set_cookies: cookies.iter().map(|c| c.to_string()).collect(),
                body: body.into(),
            },
        );
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteTransport for StubRemote {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (format!("{:?}", request.method), request.url.clone());
        let reply = self.replies.lock().unwrap().get(&key).cloned();
        Ok(reply.unwrap_or(RemoteResponse {
            status: 404,
            final_url: request.url,
            set_cookies: Vec::new(),
            body: Bytes::from_static(b"not found"),
        }))
    }
}

pub fn happy_path(remote: &StubRemote) {
    remote.reply(
        HttpMethod::Get,
        &format!("{BASE}/read/{TOKEN}"),
        200,
        &["sess=1; Path=/"],
        "<meta name=\"og:title\" content=\"My Thesis\"><meta name=\"ol-csrfToken\" content=\"csrf-xyz\">",
    );
    remote.reply(
        HttpMethod::Post,
        &format!("{BASE}/read/{TOKEN}/grant"),
        200,
        &[],
        serde_json::to_vec(&json!({ "redirect": "/project/p42" })).unwrap(),
    );
    remote.reply(
        HttpMethod::Get,
        &format!("{BASE}/project/p42"),
        200,
        &[],
        "<meta name=\"og:title\" content=\"My Thesis\">",
    );
    remote.reply(
        HttpMethod::Post,
        &format!("{BASE}/project/p42/compile?auto_compile=true"),
        200,
        &[],
        serde_json::to_vec(&json!({
            "status": "success",
            "outputFiles": [{ "type": "pdf", "url": "/out.pdf" }],
            "pdfDownloadDomain": "https://clsi.example.com",
            "compileGroup": "standard",
            "clsiServerId": "clsi-1"
        }))
        .unwrap(),
    );
    remote.reply(HttpMethod::Get, PDF_URL, 200, &[], Bytes::from_static(PDF_BYTES));
}

pub struct TestApp {
    pub router: Router,
    pub remote: Arc<StubRemote>,
    pub cache: Arc<ArtifactCache>,
}

impl TestApp {
    pub fn new(options: ResolverOptions) -> Self {
        let remote = Arc::new(StubRemote::default());
        let cache = Arc::new(ArtifactCache::new(DEFAULT_TTL));
        let runner = StageRunner::new(
            remote.clone(),
            Arc::new(RegexExtractor::new()),
            Endpoints::new(BASE),
        );
        let resolver = Arc::new(Resolver::new(runner, cache.clone(), options));
        Self {
            router: create_router(AppState::new(resolver)),
            remote,
            cache,
        }
    }

    pub fn with_strategy(strategy: ArtifactStrategy) -> Self {
        Self::new(ResolverOptions {
            strategy,
            ..ResolverOptions::default()
        })
    }

    /// Sends a GET and returns status, headers and raw body.
    pub async fn get(&self, uri: &str) -> (StatusCode, axum::http::HeaderMap, Bytes) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, body)
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, _, body) = self.get(uri).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }
}
