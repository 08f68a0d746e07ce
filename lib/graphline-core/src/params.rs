//! Request parameters.
//!
//! [`Params`] maps string keys to [`ParamValue`]s. Keys are kept sorted, so
//! every encoding that walks a mapping (query strings, form bodies, multipart
//! parts) sees the same order.
//!
//! # Example
//!
//! ```
//! use graphline_core::{Params, ParamValue};
//! use serde_json::json;
//!
//! let params = Params::new()
//!     .with("message", "Hello")
//!     .with("published", false)
//!     .with("targeting", json!({"countries": ["FR"]}));
//!
//! assert_eq!(params.len(), 3);
//! assert!(matches!(params.get("published"), Some(ParamValue::Bool(false))));
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde_json::{Map, Number, Value};

use crate::{Error, Result, UploadableValue};

/// A single parameter value.
///
/// Strings are sent as-is. Every other scalar or structure is sent as its JSON
/// text, so `true` stays `true` and a nested string keeps its quotes.
/// Uploads can only travel in a multipart body.
#[derive(Debug)]
pub enum ParamValue {
    /// Sent verbatim.
    String(String),
    /// Sent as a JSON number.
    Number(Number),
    /// Sent as `true` / `false`.
    Bool(bool),
    /// Any other JSON value (arrays, objects, null), sent as JSON text.
    Structured(Value),
    /// Binary payload, forces a multipart body.
    Upload(UploadableValue),
}

impl ParamValue {
    /// Returns `true` for an upload.
    #[must_use]
    pub const fn is_upload(&self) -> bool {
        matches!(self, Self::Upload(_))
    }

    /// Textual wire form: strings verbatim, everything else as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] for an upload, which has no textual form.
    pub fn to_text(&self) -> Result<String> {
        match self {
            Self::String(value) => Ok(value.clone()),
            Self::Number(value) => Ok(value.to_string()),
            Self::Bool(value) => Ok(value.to_string()),
            Self::Structured(value) => Ok(value.to_string()),
            Self::Upload(upload) => Err(Error::encoding(format!(
                "upload '{}' cannot be sent as text",
                upload.filename()
            ))),
        }
    }

    /// JSON form of the value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] for an upload.
    pub fn to_json(&self) -> Result<Value> {
        match self {
            Self::String(value) => Ok(Value::String(value.clone())),
            Self::Number(value) => Ok(Value::Number(value.clone())),
            Self::Bool(value) => Ok(Value::Bool(*value)),
            Self::Structured(value) => Ok(value.clone()),
            Self::Upload(upload) => Err(Error::encoding(format!(
                "upload '{}' cannot be sent in a JSON body",
                upload.filename()
            ))),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        Value::from(value).into()
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        // Non-finite floats become JSON null.
        Value::from(value).into()
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(value) => Self::String(value),
            Value::Number(value) => Self::Number(value),
            Value::Bool(value) => Self::Bool(value),
            other => Self::Structured(other),
        }
    }
}

impl From<UploadableValue> for ParamValue {
    fn from(value: UploadableValue) -> Self {
        Self::Upload(value)
    }
}

// ============================================================================
// Params
// ============================================================================

/// Parameter mapping of one request, ordered by key.
#[derive(Debug, Default)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder-style).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a parameter, returning the value it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a parameter.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    /// Get a parameter by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if any value is an upload.
    #[must_use]
    pub fn has_uploads(&self) -> bool {
        self.0.values().any(ParamValue::is_upload)
    }

    /// Iterate in ascending key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.0.iter()
    }

    /// The whole mapping as one JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the mapping holds an upload.
    pub fn to_json(&self) -> Result<Value> {
        let mut object = Map::new();
        for (key, value) in &self.0 {
            object.insert(key.clone(), value.to_json()?);
        }
        Ok(Value::Object(object))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.extend(iter);
        params
    }
}

impl<K, V> Extend<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for Params {
    type Item = (String, ParamValue);
    type IntoIter = btree_map::IntoIter<String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_form_strings_verbatim_others_json() {
        assert_eq!(ParamValue::from("My String").to_text().expect("text"), "My String");
        assert_eq!(ParamValue::from(2).to_text().expect("text"), "2");
        assert_eq!(ParamValue::from(1.5).to_text().expect("text"), "1.5");
        assert_eq!(ParamValue::from(true).to_text().expect("text"), "true");
        assert_eq!(
            ParamValue::from(json!(["a", 1])).to_text().expect("text"),
            r#"["a",1]"#
        );
        assert_eq!(
            ParamValue::from(json!({"name": "my string"}))
                .to_text()
                .expect("text"),
            r#"{"name":"my string"}"#
        );
        assert_eq!(ParamValue::from(Value::Null).to_text().expect("text"), "null");
    }

    #[test]
    fn json_scalars_map_to_their_variants() {
        assert!(matches!(ParamValue::from(json!("x")), ParamValue::String(_)));
        assert!(matches!(ParamValue::from(json!(3)), ParamValue::Number(_)));
        assert!(matches!(ParamValue::from(json!(false)), ParamValue::Bool(false)));
        assert!(matches!(ParamValue::from(json!([1])), ParamValue::Structured(_)));
        assert!(matches!(ParamValue::from(f64::NAN), ParamValue::Structured(Value::Null)));
    }

    #[test]
    fn upload_has_no_text_form() {
        let value = ParamValue::from(UploadableValue::from_bytes("x"));
        assert!(value.is_upload());
        assert!(value.to_text().expect_err("upload").is_encoding());
        assert!(value.to_json().expect_err("upload").is_encoding());
    }

    #[test]
    fn params_iterate_in_key_order() {
        let params: Params = [("b", 2), ("a", 1), ("C", 3)].into_iter().collect();
        let keys: Vec<&str> = params.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["C", "a", "b"]);
    }

    #[test]
    fn params_detect_uploads() {
        let params = Params::new().with("message", "hi");
        assert!(!params.has_uploads());

        let params = params.with("source", UploadableValue::from_bytes("img"));
        assert!(params.has_uploads());
    }

    #[test]
    fn params_to_json_whole_mapping() {
        let params = Params::new()
            .with("a", 2)
            .with("b", "My String")
            .with("c", json!({"d": true}));

        assert_eq!(
            params.to_json().expect("json"),
            json!({"a": 2, "b": "My String", "c": {"d": true}})
        );
    }

    #[test]
    fn params_insert_replaces() {
        let mut params = Params::new();
        assert!(params.insert("a", 1).is_none());
        assert!(matches!(params.insert("a", "x"), Some(ParamValue::Number(_))));
        assert_eq!(params.len(), 1);
        assert!(params.remove("a").is_some());
        assert!(params.is_empty());
    }
}
