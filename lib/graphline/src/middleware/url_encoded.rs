//! URL-encoded form body middleware.
//!
//! Encodes any [`Body::Params`] still pending as
//! `application/x-www-form-urlencoded`. Placed after the multipart encoder,
//! it only ever sees mappings without uploads.

use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};

use graphline_core::{
    Body, ContentType, Error, Request, Response, Result, encode_params, header,
};

use crate::ServiceFuture;

/// Layer that encodes parameter bodies as a URL-encoded form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlEncodedLayer;

impl UrlEncodedLayer {
    /// Create a new URL-encoded form layer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for UrlEncodedLayer {
    type Service = UrlEncoded<S>;

    fn layer(&self, inner: S) -> Self::Service {
        UrlEncoded { inner }
    }
}

/// Service that encodes form bodies.
#[derive(Debug, Clone)]
pub struct UrlEncoded<S> {
    inner: S,
}

fn encode(request: &mut Request) -> Result<()> {
    if request.body().params().is_none() {
        return Ok(());
    }
    let Body::Params(params) = request.take_body() else {
        return Ok(());
    };

    let body = encode_params(&params)?;
    if request.header(header::CONTENT_TYPE.as_str()).is_none() {
        request.set_header(
            header::CONTENT_TYPE.as_str(),
            ContentType::FormUrlEncoded.as_str(),
        );
    }
    request.set_body(Bytes::from(body));
    Ok(())
}

impl<S> Service<Request> for UrlEncoded<S>
where
    S: Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move {
            encode(&mut request)?;
            inner.call(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use graphline_core::{Params, UploadableValue, Verb};

    use super::*;

    fn request(params: Params) -> Request {
        let url = url::Url::parse("https://graph.facebook.com/me/feed").expect("valid URL");
        Request::builder(Verb::Post, url).params(params).build()
    }

    #[test]
    fn params_become_form_body() {
        let mut request = request(Params::new().with("b", "My String").with("a", 2));
        encode(&mut request).expect("encode");

        assert_eq!(
            request.header("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        let Body::Bytes(body) = request.body() else {
            panic!("expected encoded body");
        };
        assert_eq!(body.as_ref(), b"a=2&b=My+String");
    }

    #[test]
    fn existing_content_type_is_kept() {
        let mut request = request(Params::new().with("a", 1));
        request.set_header("content-type", "application/x-www-form-urlencoded; charset=utf-8");
        encode(&mut request).expect("encode");

        assert_eq!(
            request.header("Content-Type"),
            Some("application/x-www-form-urlencoded; charset=utf-8")
        );
    }

    #[test]
    fn leftover_upload_is_an_encoding_error() {
        let mut request = request(Params::new().with("source", UploadableValue::from_bytes("x")));
        assert!(encode(&mut request).expect_err("upload").is_encoding());
    }

    #[test]
    fn encoded_bodies_pass_through() {
        let url = url::Url::parse("https://graph.facebook.com/me/feed").expect("valid URL");
        let mut request = Request::builder(Verb::Post, url)
            .header("Content-Type", "application/json")
            .body(Bytes::from_static(b"{}"))
            .build();

        encode(&mut request).expect("encode");
        assert_eq!(request.header("content-type"), Some("application/json"));
    }
}
