//! Request dispatch, response decoding and the cast helpers built on them.
//!
//! # Design
//! `Service` holds a transport, a config provider and the caller's header
//! overrides. Custom overrides keep their bare names and pick up the
//! configured prefix when a call is prepared. Every call takes a fresh config snapshot and assembles its own
//! `HeaderSet` from it, so calls never write to shared state and config
//! changes apply to the next call. The pure halves (`build_request`,
//! `parse_response`) are public for hosts that perform I/O themselves.

use serde::ser::Error as _;
use serde_json::{Map, Value};
use tracing::debug;
use url::form_urlencoded;

use crate::cast::{self, CastMany};
use crate::config::{Config, ConfigProvider};
use crate::error::{CastError, SdkError};
use crate::headers::{HeaderBuilder, HeaderSet};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

const CONTENT_TYPE: &str = "Content-Type";
const APPLICATION_JSON: &str = "application/json";

/// Authenticated client for the remote API.
#[derive(Debug, Clone)]
pub struct Service<T, C = Config> {
    transport: T,
    config: C,
    overrides: Overrides,
}

/// Caller headers. Custom entries are stored without the prefix.
#[derive(Debug, Clone, Default)]
struct Overrides {
    plain: HeaderSet,
    custom: HeaderSet,
}

impl Overrides {
    fn builder(&self, prefix: &str) -> HeaderBuilder {
        let mut builder = HeaderBuilder::with_headers(prefix, self.plain.clone());
        for (name, value) in self.custom.iter() {
            builder.set_custom_header(name, value);
        }
        builder
    }
}

impl<T: Transport, C: ConfigProvider> Service<T, C> {
    pub fn new(transport: T, config: C) -> Self {
        Self {
            transport,
            config,
            overrides: Overrides::default(),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Header overrides
    // -----------------------------------------------------------------------

    /// Replace all caller headers, custom ones included.
    pub fn set_headers(&mut self, headers: HeaderSet) -> &mut Self {
        self.overrides = Overrides {
            plain: headers,
            custom: HeaderSet::new(),
        };
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.overrides.plain.set(name, value);
        self
    }

    /// Set `<prefix><name>`. The prefix is read from config on every call.
    pub fn set_custom_header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.overrides.custom.set(name, value);
        self
    }

    /// Caller headers with custom names under the current prefix; the
    /// per-call auth headers are not included.
    pub fn headers(&self) -> HeaderSet {
        self.overrides.builder(&self.config.custom_header_prefix()).build()
    }

    /// Headers the next call would send.
    pub fn prepare_headers(&self) -> HeaderSet {
        prepare_headers(&self.overrides, &self.config.snapshot())
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    pub fn build_request(
        &self,
        verb: HttpMethod,
        method: &str,
        request: Option<Value>,
    ) -> Result<HttpRequest, SdkError> {
        build_request(&self.overrides, &self.config.snapshot(), verb, method, request)
    }

    /// Decode a response, mapping non-2xx statuses to error kinds.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, SdkError> {
        parse_response(response)
    }

    /// Send one request and return the decoded body verbatim.
    pub fn call(&self, verb: HttpMethod, method: &str, request: Option<Value>) -> Result<Value, SdkError> {
        let config = self.config.snapshot();
        let request = build_request(&self.overrides, &config, verb, method, request)?;

        debug!(
            verb = %request.method,
            url = %request.url,
            headers = ?request.headers.redacted(),
            "dispatching request"
        );
        let response = self.transport.send(&request, &config)?;
        debug!(verb = %request.method, url = %request.url, status = response.status, "received response");

        parse_response(response)
    }

    pub fn get(&self, method: &str, request: Option<Value>) -> Result<Value, SdkError> {
        self.call(HttpMethod::Get, method, request)
    }

    pub fn post(&self, method: &str, request: Option<Value>) -> Result<Value, SdkError> {
        self.call(HttpMethod::Post, method, request)
    }

    pub fn put(&self, method: &str, request: Option<Value>) -> Result<Value, SdkError> {
        self.call(HttpMethod::Put, method, request)
    }

    pub fn patch(&self, method: &str, request: Option<Value>) -> Result<Value, SdkError> {
        self.call(HttpMethod::Patch, method, request)
    }

    pub fn delete(&self, method: &str, request: Option<Value>) -> Result<Value, SdkError> {
        self.call(HttpMethod::Delete, method, request)
    }

    // -----------------------------------------------------------------------
    // Call and cast
    // -----------------------------------------------------------------------

    pub fn call_and_cast<R, E, F>(
        &self,
        factory: F,
        verb: HttpMethod,
        method: &str,
        request: Option<Value>,
    ) -> Result<R, SdkError>
    where
        F: FnOnce(Value) -> Result<R, E>,
        E: Into<CastError>,
    {
        let raw = self.call(verb, method, request)?;
        cast::cast(factory, raw).map_err(SdkError::cast)
    }

    pub fn get_and_cast<R, E, F>(&self, factory: F, method: &str, request: Option<Value>) -> Result<R, SdkError>
    where
        F: FnOnce(Value) -> Result<R, E>,
        E: Into<CastError>,
    {
        self.call_and_cast(factory, HttpMethod::Get, method, request)
    }

    pub fn post_and_cast<R, E, F>(&self, factory: F, method: &str, request: Option<Value>) -> Result<R, SdkError>
    where
        F: FnOnce(Value) -> Result<R, E>,
        E: Into<CastError>,
    {
        self.call_and_cast(factory, HttpMethod::Post, method, request)
    }

    pub fn put_and_cast<R, E, F>(&self, factory: F, method: &str, request: Option<Value>) -> Result<R, SdkError>
    where
        F: FnOnce(Value) -> Result<R, E>,
        E: Into<CastError>,
    {
        self.call_and_cast(factory, HttpMethod::Put, method, request)
    }

    pub fn patch_and_cast<R, E, F>(&self, factory: F, method: &str, request: Option<Value>) -> Result<R, SdkError>
    where
        F: FnOnce(Value) -> Result<R, E>,
        E: Into<CastError>,
    {
        self.call_and_cast(factory, HttpMethod::Patch, method, request)
    }

    pub fn delete_and_cast<R, E, F>(&self, factory: F, method: &str, request: Option<Value>) -> Result<R, SdkError>
    where
        F: FnOnce(Value) -> Result<R, E>,
        E: Into<CastError>,
    {
        self.call_and_cast(factory, HttpMethod::Delete, method, request)
    }

    pub fn call_and_cast_many<R, E, F>(
        &self,
        factory: F,
        verb: HttpMethod,
        method: &str,
        request: Option<Value>,
    ) -> Result<CastMany<R>, SdkError>
    where
        F: FnMut(Value) -> Result<R, E>,
        E: Into<CastError>,
    {
        let raw = self.call(verb, method, request)?;
        cast::cast_many(factory, raw)
    }

    pub fn get_and_cast_many<R, E, F>(
        &self,
        factory: F,
        method: &str,
        request: Option<Value>,
    ) -> Result<CastMany<R>, SdkError>
    where
        F: FnMut(Value) -> Result<R, E>,
        E: Into<CastError>,
    {
        self.call_and_cast_many(factory, HttpMethod::Get, method, request)
    }
}

/// Overrides plus version, locale and bearer auth from `config`.
fn prepare_headers(overrides: &Overrides, config: &Config) -> HeaderSet {
    let mut builder = overrides.builder(&config.custom_header_prefix);
    builder.prepare(config);
    builder.build()
}

/// `<protocol>://<endpoint>/<method>`, without doubled slashes.
pub fn build_url(config: &Config, method: &str) -> String {
    format!(
        "{}://{}/{}",
        config.protocol,
        config.endpoint.trim_end_matches('/'),
        method.trim_start_matches('/')
    )
}

fn build_request(
    overrides: &Overrides,
    config: &Config,
    verb: HttpMethod,
    method: &str,
    request: Option<Value>,
) -> Result<HttpRequest, SdkError> {
    let request = match request {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(request) => request,
    };
    let mut headers = prepare_headers(overrides, config);
    let mut url = build_url(config, method);

    let body = if verb.has_body() {
        headers.set(CONTENT_TYPE, APPLICATION_JSON);
        Some(serde_json::to_string(&request)?)
    } else {
        let query = encode_query(&request)?;
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
        None
    };

    Ok(HttpRequest {
        method: verb,
        url,
        headers,
        body,
    })
}

fn parse_response(response: HttpResponse) -> Result<Value, SdkError> {
    if !response.is_success() {
        return Err(SdkError::from_status(response.status, response.body));
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| SdkError::Response(format!("body is not JSON: {e}")))
}

/// Form-encode request parameters, bracketing nested keys (`a[b]=1`,
/// `ids[]=2`). Nulls are dropped and booleans become `1`/`0`.
fn encode_query(request: &Value) -> Result<String, SdkError> {
    let mut pairs = Vec::new();
    match request {
        Value::Object(map) => {
            for (key, value) in map {
                flatten(key.clone(), value, &mut pairs);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                flatten(index.to_string(), value, &mut pairs);
            }
        }
        other => {
            return Err(SdkError::Serialization(serde_json::Error::custom(format!(
                "query parameters must be a mapping, got {other}"
            ))))
        }
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
    Ok(serializer.finish())
}

fn flatten(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((key, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((key, n.to_string())),
        Value::String(s) => out.push((key, s.clone())),
        Value::Array(items) => {
            for item in items {
                flatten(format!("{key}[]"), item, out);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten(format!("{key}[{sub}]"), item, out);
            }
        }
    }
}
