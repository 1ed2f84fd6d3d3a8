//! Read-only access to collector output.
//!
//! The collector writes one JSON document shaped as
//! `service -> operation -> location -> entry`. Plugins never touch that
//! document directly; every read goes through [`Cache::lookup`], which also
//! records the path into a [`SourceTrace`].

pub mod source;

pub use source::SourceTrace;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A provider API call, written `service:operation` in plugin metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiCall {
    pub service: &'static str,
    pub operation: &'static str,
}

impl ApiCall {
    pub const fn new(service: &'static str, operation: &'static str) -> Self {
        Self { service, operation }
    }

    /// Address this call at one location
    pub fn at<'a>(&self, location: &'a str) -> CacheKey<'a> {
        CacheKey {
            call: *self,
            location,
        }
    }
}

impl fmt::Display for ApiCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service, self.operation)
    }
}

impl Serialize for ApiCall {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Full path of one cached entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKey<'a> {
    pub call: ApiCall,
    pub location: &'a str,
}

impl fmt::Display for CacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.call, self.location)
    }
}

/// Result of one collector call at one location.
///
/// `data` is kept as raw JSON: list calls store an array, get-style calls an
/// object. Whether a payload is usable is up to the reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<Value>,
}

impl CacheEntry {
    pub fn with_data(data: Vec<Value>) -> Self {
        Self {
            data: Some(Value::Array(data)),
            err: None,
        }
    }

    pub fn with_error(err: impl Into<Value>) -> Self {
        Self {
            data: None,
            err: Some(err.into()),
        }
    }

    /// True when a truthy error was recorded or no payload exists.
    /// `""`, `false` and `0` do not count as errors.
    pub fn is_failed(&self) -> bool {
        self.err.as_ref().is_some_and(is_truthy) || !self.data.as_ref().is_some_and(is_truthy)
    }

    /// The payload as a list of records, if it is one
    pub fn records(&self) -> Option<&[Value]> {
        self.data.as_ref()?.as_array().map(Vec::as_slice)
    }

    /// Best-effort description of the recorded collection error
    pub fn error_text(&self) -> String {
        match &self.err {
            Some(err) if is_truthy(err) => match err {
                Value::String(s) => s.clone(),
                Value::Object(obj) => {
                    if let Some(message) = obj.get("message").and_then(Value::as_str) {
                        message.to_string()
                    } else if let Some(code) = obj.get("code") {
                        match code {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        }
                    } else {
                        err.to_string()
                    }
                }
                other => other.to_string(),
            },
            _ => "Unknown error occurred".to_string(),
        }
    }
}

/// Collector payloads follow JavaScript truthiness
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

type Locations = BTreeMap<String, CacheEntry>;
type Operations = BTreeMap<String, Locations>;

/// Collector output for one assessment run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cache {
    services: BTreeMap<String, Operations>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a cache document written by the collector
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache file: {}", path.display()))?;

        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse cache file: {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Store an entry, replacing any previous one at the same path
    pub fn insert(&mut self, key: CacheKey<'_>, entry: CacheEntry) {
        self.services
            .entry(key.call.service.to_string())
            .or_default()
            .entry(key.call.operation.to_string())
            .or_default()
            .insert(key.location.to_string(), entry);
    }

    /// Builder form of [`Cache::insert`]
    pub fn with_entry(mut self, key: CacheKey<'_>, entry: CacheEntry) -> Self {
        self.insert(key, entry);
        self
    }

    /// Read an entry without recording it
    pub fn get(&self, key: CacheKey<'_>) -> Option<&CacheEntry> {
        self.services
            .get(key.call.service)?
            .get(key.call.operation)?
            .get(key.location)
    }

    /// Read an entry and record the path and what was found in `trace`
    pub fn lookup(&self, trace: &mut SourceTrace, key: CacheKey<'_>) -> Option<&CacheEntry> {
        let entry = self.get(key);
        debug!(path = %key, found = entry.is_some(), "Cache lookup");
        trace.record(key, entry);
        entry
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
