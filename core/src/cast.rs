//! Turning decoded JSON into typed records, collections and pages.
//!
//! # Design
//! A cast target is any factory `FnMut(Value) -> Result<T, E>`. Types that
//! derive `Deserialize` can pass `cast::deserialize::<T>`; hand-written
//! constructors work the same way. `cast_many` recognises the paginated
//! envelope (`total` + `data`) at the top level only: the items inside a page
//! always go through the plain-sequence path.

use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CastError, SdkError};

/// Stock factory for types that implement `Deserialize`.
pub fn deserialize<T: DeserializeOwned>(raw: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(raw)
}

/// Build one record from `raw`. Factory errors are returned untouched.
pub fn cast<T, E, F>(factory: F, raw: Value) -> Result<T, E>
where
    F: FnOnce(Value) -> Result<T, E>,
{
    factory(raw)
}

/// Ordered records cast from a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for Collection<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> From<Vec<T>> for Collection<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T> IntoIterator for Collection<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// One page of a larger result set.
///
/// Metadata is copied from the server as-is; any field other than `total`
/// is `None` when the server omits it or sends `null`. `from`/`to` are
/// 1-based inclusive bounds and are `null` on an empty page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: Option<u64>,
    pub total: u64,
    pub last_page: Option<u64>,
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub items: Collection<T>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        matches!((self.page, self.last_page), (Some(page), Some(last)) if page < last)
    }
}

/// Result of `cast_many`: either a bare collection or a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastMany<T> {
    Collection(Collection<T>),
    Page(Page<T>),
}

impl<T> CastMany<T> {
    /// The records, whichever shape the response had.
    pub fn items(&self) -> &[T] {
        match self {
            CastMany::Collection(items) => &items[..],
            CastMany::Page(page) => &page.items[..],
        }
    }

    pub fn into_items(self) -> Collection<T> {
        match self {
            CastMany::Collection(items) => items,
            CastMany::Page(page) => page.items,
        }
    }

    pub fn page(&self) -> Option<&Page<T>> {
        match self {
            CastMany::Page(page) => Some(page),
            CastMany::Collection(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

/// Cast a list response, detecting the paginated envelope.
pub fn cast_many<T, E, F>(factory: F, raw: Value) -> Result<CastMany<T>, SdkError>
where
    F: FnMut(Value) -> Result<T, E>,
    E: Into<CastError>,
{
    if is_falsy(&raw) {
        return Ok(CastMany::Collection(Collection::empty()));
    }

    match raw {
        Value::Object(mut envelope) if is_paginated(&envelope) => {
            let data = envelope.remove("data").unwrap_or(Value::Null);
            let items = cast_entries(factory, data)?;
            Ok(CastMany::Page(Page {
                page: optional_u64(&envelope, "current_page")?,
                total: required_u64(&envelope, "total")?,
                last_page: optional_u64(&envelope, "last_page")?,
                from: optional_u64(&envelope, "from")?,
                to: optional_u64(&envelope, "to")?,
                items,
            }))
        }
        other => cast_entries(factory, other).map(CastMany::Collection),
    }
}

/// Plain-sequence path. Never looks for pagination keys.
fn cast_entries<T, E, F>(mut factory: F, raw: Value) -> Result<Collection<T>, SdkError>
where
    F: FnMut(Value) -> Result<T, E>,
    E: Into<CastError>,
{
    let entries: Vec<Value> = match raw {
        raw if is_falsy(&raw) => return Ok(Collection::empty()),
        Value::Array(entries) => entries,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => {
            return Err(SdkError::Response(format!(
                "expected a list of records, got {}",
                kind_of(&other)
            )))
        }
    };

    entries
        .into_iter()
        .map(|entry| factory(entry).map_err(SdkError::cast))
        .collect::<Result<Vec<_>, _>>()
        .map(Collection::new)
}

fn is_paginated(envelope: &Map<String, Value>) -> bool {
    let present = |key: &str| envelope.get(key).is_some_and(|v| !v.is_null());
    present("total") && present("data")
}

/// Values a loosely-typed server treats as "nothing here".
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn required_u64(envelope: &Map<String, Value>, key: &str) -> Result<u64, SdkError> {
    optional_u64(envelope, key)?
        .ok_or_else(|| SdkError::Response(format!("pagination field `{key}` is missing")))
}

fn optional_u64(envelope: &Map<String, Value>, key: &str) -> Result<Option<u64>, SdkError> {
    match envelope.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .map(Some)
            .ok_or_else(|| SdkError::Response(format!("pagination field `{key}` is not a count: {n}"))),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| SdkError::Response(format!("pagination field `{key}` is not a count: {s:?}"))),
        Some(other) => Err(SdkError::Response(format!(
            "pagination field `{key}` is {}",
            kind_of(other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
