//! Per-request options.
//!
//! [`Options`] is a free-form bag of knobs attached to a request. A few keys
//! (`use_ssl`, `beta`, `video`) steer server resolution; the rest is meant for
//! the network adapter. Only the keys listed in [`TRANSPORT_OPTION_KEYS`] ever
//! reach the adapter, as [`TransportOptions`]; anything else is dropped.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

/// Option keys forwarded to the network adapter.
pub const TRANSPORT_OPTION_KEYS: [&str; 9] = [
    "request",
    "proxy",
    "ssl",
    "builder",
    "url",
    "parallel_manager",
    "params",
    "headers",
    "builder_class",
];

/// Free-form request options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(BTreeMap<String, Value>);

impl Options {
    /// Create an empty set of options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option (builder-style).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set an option, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Get an option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Boolean option, `None` when unset or not a boolean.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Returns `true` if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// These options layered over `defaults`: keys set here win.
    #[must_use]
    pub fn merged_over(&self, defaults: &Self) -> Self {
        let mut merged = defaults.0.clone();
        merged.extend(self.0.iter().map(|(key, value)| (key.clone(), value.clone())));
        Self(merged)
    }

    /// Keep only the keys the adapter is allowed to see.
    #[must_use]
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions(
            self.0
                .iter()
                .filter(|(key, _)| TRANSPORT_OPTION_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Options that survived the allow-list, handed to the network adapter.
///
/// Travels with each pipeline request as an extension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportOptions(BTreeMap<String, Value>);

impl TransportOptions {
    /// Get an option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Option keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns `true` if nothing survived filtering.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Extra request headers from the `headers` object.
    ///
    /// Non-string values are rendered as JSON text.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        self.object_pairs("headers")
    }

    /// Extra query parameters from the `params` object.
    ///
    /// Non-string values are rendered as JSON text.
    #[must_use]
    pub fn params(&self) -> Vec<(String, String)> {
        self.object_pairs("params")
    }

    /// Request timeout from `request.timeout`, in seconds.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.0
            .get("request")
            .and_then(|request| request.get("timeout"))
            .and_then(Value::as_f64)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    fn object_pairs(&self, key: &str) -> Vec<(String, String)> {
        let Some(object) = self.0.get(key).and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut pairs: Vec<(String, String)> = object
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(value) => value.clone(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect();
        pairs.sort();
        pairs
    }
}
