//! Typed shapes of the provider records the plugins read.
//!
//! Only the fields a rule needs are modelled, and each of them decodes
//! leniently: a value of the wrong type becomes `None` so the rule still
//! reports on the resource. The resource id is read from the raw record by
//! [`resource_id`], independent of the shape.

pub mod container_service;
pub mod event_grid;

pub use container_service::{ManagedCluster, ManagedServiceIdentity};
pub use event_grid::EventGridDomain;

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A record shape a rule evaluates. `Default` is the shape of a record whose
/// fields are all missing.
pub trait CloudResource: DeserializeOwned + Default {}

/// Identifier usable for reporting; absent, non-string and blank ids are not
pub fn resource_id(record: &Value) -> Option<&str> {
    record
        .get("id")?
        .as_str()
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Accept a string or a bare number, as collectors are inconsistent about
/// version-like fields. Anything else reads as absent.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept a JSON object; anything else reads as absent
pub(crate) fn lenient_object<'de, D>(deserializer: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    })
}

/// Read the leading decimal number of `text`, ignoring whatever follows:
/// `"1.2 "`, `"1.2.0"` and `"1.2abc"` all read as 1.2
pub(crate) fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - digits_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let fraction_start = end + 1;
        let mut fraction_end = fraction_start;
        while fraction_end < bytes.len() && bytes[fraction_end].is_ascii_digit() {
            fraction_end += 1;
        }
        digits += fraction_end - fraction_start;
        if digits > 0 {
            end = fraction_end;
        }
    }

    if digits == 0 {
        return None;
    }

    text[..end].parse().ok()
}
