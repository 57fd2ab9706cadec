//! Header assembly for outbound calls.
//!
//! # Design
//! `HeaderSet` is an ordered name/value list with upsert semantics. Names are
//! compared exactly, so `Authorization` and `authorization` are distinct
//! entries. `HeaderBuilder` layers the configured custom-header prefix and
//! the per-call auth/locale/version headers on top of caller overrides.

use crate::config::ConfigProvider;

/// Custom header name carrying the SDK version.
pub const VERSION_HEADER: &str = "Version";
pub const ACCEPT_LANGUAGE: &str = "Accept-Language";
pub const AUTHORIZATION: &str = "Authorization";

/// Ordered header map. Upserting an existing name keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Copy of the entries with the bearer token masked, for logging.
    pub fn redacted(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(n, v)| {
                if n == AUTHORIZATION {
                    (n.clone(), "Bearer ***".to_string())
                } else {
                    (n.clone(), v.clone())
                }
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        for (name, value) in iter {
            set.set(name, value);
        }
        set
    }
}

impl IntoIterator for HeaderSet {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Builds the header set for one call.
#[derive(Debug, Clone, Default)]
pub struct HeaderBuilder {
    prefix: String,
    headers: HeaderSet,
}

impl HeaderBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            headers: HeaderSet::new(),
        }
    }

    pub fn with_headers(prefix: impl Into<String>, headers: HeaderSet) -> Self {
        Self {
            prefix: prefix.into(),
            headers,
        }
    }

    /// Replace every header.
    pub fn set_headers(&mut self, headers: HeaderSet) -> &mut Self {
        self.headers = headers;
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    /// Upsert `<prefix><name>`.
    pub fn set_custom_header(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.headers.set(format!("{}{name}", self.prefix), value);
        self
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Stamp version, locale and bearer auth from `config`, overwriting any
    /// existing values under the same names.
    pub fn prepare(&mut self, config: &impl ConfigProvider) -> &mut Self {
        self.set_custom_header(VERSION_HEADER, config.version());
        self.set_header(ACCEPT_LANGUAGE, config.language());
        self.set_header(AUTHORIZATION, format!("Bearer {}", config.api_key()));
        self
    }

    pub fn build(self) -> HeaderSet {
        self.headers
    }
}
