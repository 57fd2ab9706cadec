//! Configuration surface consumed by the SDK on every call.
//!
//! # Design
//! `Service` never caches configuration: it asks its `ConfigProvider` for a
//! `snapshot()` at the start of each call, so a provider whose values change
//! (see `SharedConfig`) affects the next call without rebuilding anything.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

pub const DEFAULT_HEADER_PREFIX: &str = "X-Essentials-";

/// Read-only view of the settings a call needs.
pub trait ConfigProvider {
    fn protocol(&self) -> String;
    fn endpoint(&self) -> String;
    fn api_key(&self) -> String;
    fn language(&self) -> String;
    fn proxy(&self) -> Option<String>;
    /// Whether TLS certificates are verified.
    fn verify(&self) -> bool;
    /// SDK version sent in the custom `Version` header.
    fn version(&self) -> String;
    fn custom_header_prefix(&self) -> String;

    /// Consistent copy of every setting, taken once per call.
    fn snapshot(&self) -> Config {
        Config {
            protocol: self.protocol(),
            endpoint: self.endpoint(),
            api_key: self.api_key(),
            language: self.language(),
            proxy: self.proxy(),
            verify: self.verify(),
            version: self.version(),
            custom_header_prefix: self.custom_header_prefix(),
        }
    }
}

/// Plain settings value. Deserializable so hosts can load it from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub protocol: String,
    pub endpoint: String,
    pub api_key: String,
    pub language: String,
    pub proxy: Option<String>,
    pub verify: bool,
    pub version: String,
    pub custom_header_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol: "https".to_string(),
            endpoint: "localhost".to_string(),
            api_key: String::new(),
            language: "en".to_string(),
            proxy: None,
            verify: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
            custom_header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Defaults overlaid with `ESSENTIALS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each
    /// `ESSENTIALS_*` key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(v) = lookup("ESSENTIALS_PROTOCOL") {
            config.protocol = v;
        }
        if let Some(v) = lookup("ESSENTIALS_ENDPOINT") {
            config.endpoint = v;
        }
        if let Some(v) = lookup("ESSENTIALS_API_KEY") {
            config.api_key = v;
        }
        if let Some(v) = lookup("ESSENTIALS_LANGUAGE") {
            config.language = v;
        }
        if let Some(v) = lookup("ESSENTIALS_PROXY") {
            config.proxy = Some(v).filter(|p| !p.is_empty());
        }
        if let Some(v) = lookup("ESSENTIALS_VERIFY") {
            config.verify = !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        if let Some(v) = lookup("ESSENTIALS_HEADER_PREFIX") {
            config.custom_header_prefix = v;
        }
        config
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_custom_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.custom_header_prefix = prefix.into();
        self
    }
}

impl ConfigProvider for Config {
    fn protocol(&self) -> String {
        self.protocol.clone()
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    fn api_key(&self) -> String {
        self.api_key.clone()
    }

    fn language(&self) -> String {
        self.language.clone()
    }

    fn proxy(&self) -> Option<String> {
        self.proxy.clone()
    }

    fn verify(&self) -> bool {
        self.verify
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn custom_header_prefix(&self) -> String {
        self.custom_header_prefix.clone()
    }

    fn snapshot(&self) -> Config {
        self.clone()
    }
}

/// Cloneable handle to a `Config` that may be replaced between calls.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Apply `f` to the stored config. Calls already in flight keep the
    /// snapshot they took.
    pub fn update(&self, f: impl FnOnce(&mut Config)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    pub fn replace(&self, config: Config) {
        self.update(|current| *current = config);
    }
}

impl ConfigProvider for SharedConfig {
    fn protocol(&self) -> String {
        self.snapshot().protocol
    }

    fn endpoint(&self) -> String {
        self.snapshot().endpoint
    }

    fn api_key(&self) -> String {
        self.snapshot().api_key
    }

    fn language(&self) -> String {
        self.snapshot().language
    }

    fn proxy(&self) -> Option<String> {
        self.snapshot().proxy
    }

    fn verify(&self) -> bool {
        self.snapshot().verify
    }

    fn version(&self) -> String {
        self.snapshot().version
    }

    fn custom_header_prefix(&self) -> String {
        self.snapshot().custom_header_prefix
    }

    fn snapshot(&self) -> Config {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
