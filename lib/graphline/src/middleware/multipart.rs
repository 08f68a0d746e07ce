//! Multipart body encoding middleware.
//!
//! Turns a [`Body::Params`] into a `multipart/form-data` body when the
//! mapping holds an upload, or when the request already announces a
//! multipart content type. Any other request passes through untouched.

use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};

use graphline_core::{
    Body, ContentType, Error, MultipartBuilder, Request, Response, Result, header,
};

use crate::ServiceFuture;

/// Layer that encodes upload-carrying parameter bodies as multipart.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultipartEncoderLayer;

impl MultipartEncoderLayer {
    /// Create a new multipart encoder layer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for MultipartEncoderLayer {
    type Service = MultipartEncoder<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MultipartEncoder { inner }
    }
}

/// Service that encodes multipart bodies.
#[derive(Debug, Clone)]
pub struct MultipartEncoder<S> {
    inner: S,
}

fn wants_multipart(request: &Request) -> bool {
    let Some(params) = request.body().params() else {
        return false;
    };
    params.has_uploads()
        || request
            .header(header::CONTENT_TYPE.as_str())
            .is_some_and(|value| ContentType::FormData.matches(value))
}

/// Encode the request body in place.
fn encode(request: &mut Request) -> Result<()> {
    if !wants_multipart(request) {
        return Ok(());
    }
    let Body::Params(params) = request.take_body() else {
        return Ok(());
    };

    let (content_type, body) = MultipartBuilder::new().build(params)?.into_parts();
    request.set_header(header::CONTENT_TYPE.as_str(), content_type);
    request.set_body(body);
    Ok(())
}

impl<S> Service<Request> for MultipartEncoder<S>
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
        // Take the service that was polled ready, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move {
            encode(&mut request)?;
            inner.call(request).await
        })
    }
}
