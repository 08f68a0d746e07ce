//! Normalized responses.
//!
//! Whatever the adapter, a response is reduced to a status, a body and a
//! header map. Header lookups ignore case. A non-2xx status is still a
//! response: interpreting it is the caller's business.

use std::collections::HashMap;

use bytes::Bytes;

use crate::request::find_header;

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: HashMap<String, String>,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, HashMap<String, String>, B) {
        (self.status, self.headers, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Transform the body with a function.
    pub fn map_body<F, B2>(self, f: F) -> Response<B2>
    where
        F: FnOnce(B) -> B2,
    {
        Response {
            status: self.status,
            headers: self.headers,
            body: f(self.body),
        }
    }
}

impl Response<Bytes> {
    /// Convert the body to text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn into_text(self) -> Response<String> {
        self.map_body(|body| String::from_utf8_lossy(&body).into_owned())
    }
}

impl Response<String> {
    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::JsonDeserialization`] if the body does not fit `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json(self.body.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = Response::new(
            200,
            headers(&[("Content-Type", "text/javascript; charset=UTF-8")]),
            String::new(),
        );

        assert_eq!(
            response.header("content-type"),
            Some("text/javascript; charset=UTF-8")
        );
        assert_eq!(
            response.header("CONTENT-TYPE"),
            Some("text/javascript; charset=UTF-8")
        );
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn status_checks() {
        assert!(Response::new(204, HashMap::new(), ()).is_success());
        assert!(Response::new(404, HashMap::new(), ()).is_client_error());
        assert!(Response::new(503, HashMap::new(), ()).is_server_error());
        assert!(!Response::new(302, HashMap::new(), ()).is_success());
    }

    #[test]
    fn lossy_text_body() {
        let response = Response::new(200, HashMap::new(), Bytes::from_static(b"ok \xFF"));
        assert_eq!(response.into_text().body(), "ok \u{FFFD}");
    }

    #[test]
    fn json_body() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Me {
            id: String,
            name: String,
        }

        let response = Response::new(
            200,
            HashMap::new(),
            r#"{"id":"42","name":"Ada"}"#.to_string(),
        );

        let me: Me = response.json().expect("deserialize");
        assert_eq!(
            me,
            Me {
                id: "42".to_string(),
                name: "Ada".to_string()
            }
        );
    }
}
