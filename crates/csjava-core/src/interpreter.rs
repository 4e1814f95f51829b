//! Response interpreter
//!
//! Pulls one JSON object out of free-form model output. A reply may wrap
//! the object in a fenced ```` ```json ```` block surrounded by prose, or it
//! may be the bare object. Anything that does not parse to an object yields
//! the caller's fallback value.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Opening marker of a fenced payload block (marker token + language tag)
pub const FENCE_OPEN: &str = "```json";

/// Closing marker of a fenced payload block
pub const FENCE_CLOSE: &str = "```";

/// Locate the candidate payload inside `raw`.
///
/// The first `FENCE_OPEN` and the next `FENCE_CLOSE` after it delimit the
/// payload. A missing closing marker means the payload runs to the end of
/// the text. Without an opening marker the whole text is the candidate.
pub fn extract_payload(raw: &str) -> &str {
    match raw.find(FENCE_OPEN) {
        Some(start) => {
            let rest = &raw[start + FENCE_OPEN.len()..];
            let body = match rest.find(FENCE_CLOSE) {
                Some(end) => &rest[..end],
                None => rest,
            };
            body.trim()
        }
        None => raw,
    }
}

/// Parse the candidate payload of `raw`, returning `None` unless it is a
/// JSON object.
pub fn try_interpret(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(extract_payload(raw)) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Parse the payload of `raw`, or return `fallback` unchanged.
pub fn interpret(raw: &str, fallback: Value) -> Value {
    try_interpret(raw).unwrap_or(fallback)
}

/// Get-or-default view over an interpreted payload.
///
/// Model output is never schema-checked, so every accessor tolerates a
/// missing key or a value of the wrong type.
#[derive(Clone, Copy, Debug)]
pub struct Fields<'a> {
    value: &'a Value,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key)
    }

    /// First string found under any of `keys`
    pub fn first_str(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .find_map(|key| self.get(key).and_then(Value::as_str))
            .map(String::from)
    }

    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.first_str(&[key]).unwrap_or_else(|| default.to_string())
    }

    /// Scalar rendered as text; strings verbatim, numbers and bools via JSON
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
                .unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Array of strings; non-string scalars are rendered, nested values dropped
    pub fn strings(&self, key: &str) -> Vec<String> {
        self.strings_from(&[key])
    }

    /// Like [`Fields::strings`], reading the first key that holds an array
    pub fn strings_from(&self, keys: &[&str]) -> Vec<String> {
        let Some(items) = keys
            .iter()
            .find_map(|key| self.get(key).and_then(Value::as_array))
        else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Array of objects under the first key that holds an array
    pub fn objects(&self, keys: &[&str]) -> Vec<Fields<'a>> {
        keys.iter()
            .find_map(|key| self.get(key).and_then(Value::as_array))
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.is_object())
                    .map(Fields::new)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn object(&self, key: &str) -> Option<Fields<'a>> {
        self.get(key).filter(|v| v.is_object()).map(Fields::new)
    }

    fn map(&self, key: &str) -> Option<&'a Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    pub fn bool_map(&self, key: &str) -> BTreeMap<String, bool> {
        self.map(key)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn string_map(&self, key: &str) -> BTreeMap<String, String> {
        self.map(key)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}
