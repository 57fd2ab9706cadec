//! Executing `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the only seam that performs I/O. It returns every status
//! code as data; turning statuses into `SdkError` kinds is done by
//! `Service::parse_response`, so custom transports get the same taxonomy.

use std::sync::Arc;

use tracing::warn;
use ureq::http::HeaderMap;
use ureq::tls::TlsConfig;
use ureq::{Agent, RequestBuilder};

use crate::config::Config;
use crate::error::SdkError;
use crate::headers::HeaderSet;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one request. Non-2xx statuses must come back as `Ok`.
pub trait Transport {
    fn send(&self, request: &HttpRequest, config: &Config) -> Result<HttpResponse, SdkError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest, config: &Config) -> Result<HttpResponse, SdkError> {
        (**self).send(request, config)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest, config: &Config) -> Result<HttpResponse, SdkError> {
        (**self).send(request, config)
    }
}

/// Blocking transport backed by `ureq`.
///
/// The agent is rebuilt from the config snapshot on every call, so proxy and
/// TLS verification changes take effect on the next request.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }

    fn agent(config: &Config) -> Result<Agent, SdkError> {
        let proxy = config
            .proxy
            .as_deref()
            .map(ureq::Proxy::new)
            .transpose()
            .map_err(|e| SdkError::Transport(format!("invalid proxy: {e}")))?;

        let tls = TlsConfig::builder()
            .disable_verification(!config.verify)
            .build();

        Ok(Agent::config_builder()
            .http_status_as_error(false)
            .proxy(proxy)
            .tls_config(tls)
            .build()
            .new_agent())
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest, config: &Config) -> Result<HttpResponse, SdkError> {
        let agent = Self::agent(config)?;
        let url = request.url.as_str();
        let body = request.body.as_deref().unwrap_or_default().as_bytes();

        let result = match request.method {
            HttpMethod::Get => with_headers(agent.get(url), &request.headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(url), &request.headers).call(),
            HttpMethod::Post => with_headers(agent.post(url), &request.headers).send(body),
            HttpMethod::Put => with_headers(agent.put(url), &request.headers).send(body),
            HttpMethod::Patch => with_headers(agent.patch(url), &request.headers).send(body),
        };

        let mut response = result.map_err(|e| {
            warn!(method = %request.method, url, error = %e, "transport failed");
            SdkError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let headers = header_pairs(response.headers());
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| SdkError::Transport(format!("reading body: {e}")))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &HeaderSet) -> RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

/// Response headers as text. Bytes outside visible ASCII are decoded lossily
/// instead of blanking the value.
fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
