//! Body serialization utilities.
//!
//! - [`encode_params`] builds the sorted, form-encoded `key=value&...` string
//!   used for query strings and URL-encoded bodies.
//! - [`encode_json`] serializes a whole parameter mapping as one JSON object.
//! - [`from_json`] decodes a response body on the caller's request.

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{Params, Result};

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Multipart form data (`multipart/form-data`), without boundary.
    FormData,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::FormData => "multipart/form-data",
        }
    }

    /// Returns `true` if a `Content-Type` header value denotes this type,
    /// ignoring case and any parameters.
    #[must_use]
    pub fn matches(&self, header_value: &str) -> bool {
        header_value
            .split(';')
            .next()
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(self.as_str()))
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bytes left unescaped besides ASCII alphanumerics. Space is handled apart.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Escape one key or value: `*` becomes `%2A`, `~` stays, space becomes `+`.
fn escape(raw: &str) -> String {
    raw.split(' ')
        .map(|chunk| utf8_percent_encode(chunk, QUERY_ESCAPE).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

/// Encode a parameter mapping into a query string.
///
/// Keys come out in ascending lexical order. String values are used verbatim;
/// every other value is first turned into its JSON text. Everything outside
/// `A-Z a-z 0-9 _ . - ~` is percent-escaped and space becomes `+`. Signature
/// checks upstream depend on these exact bytes.
///
/// # Errors
///
/// Returns [`crate::Error::Encoding`] if the mapping holds an upload.
///
/// # Example
///
/// ```
/// use graphline_core::{Params, encode_params};
///
/// let params = Params::new().with("b", "My String").with("a", 2);
/// assert_eq!(encode_params(&params).expect("encode"), "a=2&b=My+String");
/// assert_eq!(encode_params(&Params::new()).expect("encode"), "");
/// ```
pub fn encode_params(params: &Params) -> Result<String> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        pairs.push(format!("{}={}", escape(key), escape(&value.to_text()?)));
    }
    Ok(pairs.join("&"))
}

/// Serialize the whole parameter mapping as a JSON object body.
///
/// # Errors
///
/// Returns [`crate::Error::Encoding`] if the mapping holds an upload.
///
/// # Example
///
/// ```
/// use graphline_core::{Params, encode_json};
///
/// let params = Params::new().with("published", true);
/// assert_eq!(encode_json(&params).expect("json").as_ref(), br#"{"published":true}"#);
/// ```
pub fn encode_json(params: &Params) -> Result<Bytes> {
    let value = params.to_json()?;
    serde_json::to_vec(&value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}
