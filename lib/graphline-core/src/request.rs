//! Requests flowing through the transport pipeline.
//!
//! A [`Request`] leaves the dispatcher with either an already-encoded body or
//! a [`Body::Params`] mapping that a body-encoding middleware still has to
//! turn into bytes. Adapter-level options ride along in the request
//! [`Extensions`](http::Extensions).
//!
//! # Example
//!
//! ```
//! use graphline_core::{Body, Params, Request, Verb};
//!
//! let url = "https://graph.facebook.com/me/feed".parse().expect("url");
//! let request = Request::builder(Verb::Post, url)
//!     .header("Accept", "application/json")
//!     .params(Params::new().with("message", "hi"))
//!     .build();
//!
//! assert_eq!(request.header("accept"), Some("application/json"));
//! assert!(matches!(request.body(), Body::Params(_)));
//! ```

use std::collections::HashMap;

use bytes::Bytes;
use url::Url;

use crate::{Params, TransportOptions, Verb};

/// Request payload.
#[derive(Debug, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// A parameter mapping not yet encoded.
    Params(Params),
    /// Encoded bytes, ready for the wire.
    Bytes(Bytes),
}

impl Body {
    /// Returns `true` for [`Body::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The unencoded mapping, if any.
    #[must_use]
    pub const fn params(&self) -> Option<&Params> {
        match self {
            Self::Params(params) => Some(params),
            _ => None,
        }
    }
}

impl From<Params> for Body {
    fn from(params: Params) -> Self {
        Self::Params(params)
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

/// An outbound request.
#[derive(Debug)]
pub struct Request {
    verb: Verb,
    url: Url,
    headers: HashMap<String, String>,
    body: Body,
    extensions: http::Extensions,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(verb: Verb, url: Url) -> RequestBuilder {
        RequestBuilder::new(verb, url)
    }

    /// HTTP verb.
    #[must_use]
    pub const fn verb(&self) -> Verb {
        self.verb
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Set a header, replacing any existing value under any casing.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        insert_header(&mut self.headers, name.into(), value.into());
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Take the body out, leaving [`Body::Empty`].
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }

    /// Request extensions.
    #[must_use]
    pub const fn extensions(&self) -> &http::Extensions {
        &self.extensions
    }

    /// Mutable request extensions.
    pub fn extensions_mut(&mut self) -> &mut http::Extensions {
        &mut self.extensions
    }

    /// Adapter-level options attached by the dispatcher.
    #[must_use]
    pub fn transport_options(&self) -> Option<&TransportOptions> {
        self.extensions.get::<TransportOptions>()
    }

    /// Consume into (verb, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Verb, Url, HashMap<String, String>, Body) {
        (self.verb, self.url, self.headers, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug)]
pub struct RequestBuilder {
    verb: Verb,
    url: Url,
    headers: HashMap<String, String>,
    body: Body,
    extensions: http::Extensions,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(verb: Verb, url: Url) -> Self {
        Self {
            verb,
            url,
            headers: HashMap::new(),
            body: Body::Empty,
            extensions: http::Extensions::new(),
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Appends an already-encoded query string to the URL.
    #[must_use]
    pub fn query_string(mut self, encoded: &str) -> Self {
        if encoded.is_empty() {
            return self;
        }
        let query = match self.url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
            _ => encoded.to_string(),
        };
        self.url.set_query(Some(&query));
        self
    }

    /// Sets an unencoded parameter body.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.body = Body::Params(params);
        self
    }

    /// Sets an encoded body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Bytes(body.into());
        self
    }

    /// Attach adapter-level options.
    #[must_use]
    pub fn transport_options(mut self, options: TransportOptions) -> Self {
        self.extensions.insert(options);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            verb: self.verb,
            url: self.url,
            headers: self.headers,
            body: self.body,
            extensions: self.extensions,
        }
    }
}

pub(crate) fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn insert_header(headers: &mut HashMap<String, String>, name: String, value: String) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}
