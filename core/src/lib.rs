//! Authenticated client core for the Essentials API.
//!
//! # Overview
//! `Service` sends GET/POST/PUT/PATCH/DELETE calls to
//! `<protocol>://<endpoint>/<method>` with bearer auth, locale and SDK
//! version headers, and returns the decoded JSON body. The `cast` module
//! turns that JSON into typed records, collections or pages.
//!
//! # Design
//! - Configuration is read from a `ConfigProvider` snapshot on every call.
//! - Headers are assembled per call; nothing a call does is visible to the
//!   next one.
//! - I/O sits behind `Transport`. `build_request`/`parse_response` stay pure
//!   so a host can own the round-trip (`UreqTransport` is the default).
//! - Casting takes a factory function instead of a type name, so any
//!   constructor `Fn(Value) -> Result<T, E>` can be a cast target.

pub mod cast;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod service;
pub mod transport;

pub use cast::{cast, cast_many, CastMany, Collection, Page};
pub use config::{Config, ConfigProvider, SharedConfig};
pub use error::SdkError;
pub use headers::{HeaderBuilder, HeaderSet};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use service::Service;
pub use transport::{Transport, UreqTransport};
