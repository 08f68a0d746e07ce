//! HTTP verbs understood by the transport.

use derive_more::Display;

/// HTTP verb of an outbound call.
///
/// Higher layers may fold every non-GET verb into a POST before a request
/// reaches this crate; the transport itself only distinguishes GET (params in
/// the query string) from everything else (params in the body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Verb {
    /// GET: parameters travel in the URL.
    #[display("GET")]
    Get,
    /// POST: parameters travel in the body.
    #[display("POST")]
    Post,
    /// PUT: parameters travel in the body.
    #[display("PUT")]
    Put,
    /// DELETE: parameters travel in the body.
    #[display("DELETE")]
    Delete,
}

impl Verb {
    /// Returns `true` for GET.
    #[must_use]
    pub const fn is_get(&self) -> bool {
        matches!(self, Self::Get)
    }

    /// Returns `true` if parameters belong in the request body.
    #[must_use]
    pub const fn carries_body(&self) -> bool {
        !self.is_get()
    }
}

impl From<Verb> for http::Method {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Get => Self::GET,
            Verb::Post => Self::POST,
            Verb::Put => Self::PUT,
            Verb::Delete => Self::DELETE,
        }
    }
}

impl TryFrom<http::Method> for Verb {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        match method {
            http::Method::GET => Ok(Self::Get),
            http::Method::POST => Ok(Self::Post),
            http::Method::PUT => Ok(Self::Put),
            http::Method::DELETE => Ok(Self::Delete),
            other => Err(crate::Error::invalid_request(format!(
                "unsupported HTTP verb: {other}"
            ))),
        }
    }
}

impl std::str::FromStr for Verb {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            _ => Err(crate::Error::invalid_request(format!(
                "unsupported HTTP verb: {s}"
            ))),
        }
    }
}
