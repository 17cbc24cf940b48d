use async_trait::async_trait;
use pipeline::{HttpMethod, RemoteRequest, RemoteResponse, RemoteTransport, TransportError};
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, SET_COOKIE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{RemoteConfig, SetupError};

/// [`RemoteTransport`] backed by a shared [`reqwest::Client`].
///
/// The client follows redirects, presents a browser `User-Agent` and `Origin`
/// on every request, and applies connect and total timeouts. It keeps no
/// cookie jar: every `Set-Cookie` of the final response is handed back to the
/// stages untouched.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &RemoteConfig) -> Result<Self, SetupError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| SetupError::InvalidHeader { name: "User-Agent" })?,
        );
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(config.origin())
                .map_err(|_| SetupError::InvalidHeader { name: "Origin" })?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .redirect(Policy::limited(config.max_redirects))
            .build()?;

        debug!(
            base_url = %config.base_url,
            timeout_secs = config.request_timeout_secs,
            "remote transport ready"
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteTransport for ReqwestTransport {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.json_body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response.bytes().await.map_err(transport_error)?;

        Ok(RemoteResponse {
            status,
            final_url,
            set_cookies,
            body,
        })
    }
}

/// Converts a reqwest failure, dropping the URL so messages stay short.
fn transport_error(err: reqwest::Error) -> TransportError {
    let timed_out = err.is_timeout();
    if timed_out {
        warn!("remote request timed out");
    }
    TransportError {
        message: err.without_url().to_string(),
        timed_out,
    }
}
