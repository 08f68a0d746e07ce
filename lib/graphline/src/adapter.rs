//! Network adapter using hyper-util.
//!
//! [`HyperAdapter`] is the innermost service of a
//! [`TransportPipeline`](crate::TransportPipeline). It sends already-encoded
//! requests and buffers the response. Of the [`TransportOptions`] it honors
//! `headers`, `params` and `request.timeout`; the other allow-listed keys are
//! carried but not interpreted here.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::io;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower_service::Service;

use graphline_core::{Body, Error, Request, Response, Result, TransportOptions};

use crate::{AdapterConfig, ServiceFuture, connector::https_connector};

/// Network adapter over a pooled hyper client.
#[derive(Clone)]
pub struct HyperAdapter {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: AdapterConfig,
}

impl std::fmt::Debug for HyperAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperAdapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for HyperAdapter {
    fn default() -> Self {
        Self::new(AdapterConfig::default())
    }
}

impl HyperAdapter {
    /// Create an adapter with its own connection pool.
    #[must_use]
    pub fn new(config: AdapterConfig) -> Self {
        let connector = https_connector(&config);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    /// Adapter configuration.
    #[must_use]
    pub const fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Build a hyper request, applying the adapter-level options.
    fn build_hyper_request(
        request: Request,
        options: &TransportOptions,
    ) -> Result<http::Request<Full<Bytes>>> {
        let (verb, mut url, mut headers, body) = request.into_parts();

        let body = match body {
            Body::Empty => Full::default(),
            Body::Bytes(bytes) => Full::new(bytes),
            Body::Params(_) => {
                return Err(Error::encoding(
                    "parameters reached the network adapter unencoded",
                ));
            }
        };

        let extra_params = options.params();
        if !extra_params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in &extra_params {
                query.append_pair(name, value);
            }
        }

        for (name, value) in options.headers() {
            if !headers.keys().any(|key| key.eq_ignore_ascii_case(&name)) {
                headers.insert(name, value);
            }
        }

        let mut builder = http::Request::builder()
            .method(http::Method::from(verb))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    /// Flatten a hyper header map, joining repeated fields with `", "` in
    /// arrival order. Non-UTF-8 bytes are replaced rather than dropped.
    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        let mut flat: HashMap<String, String> = HashMap::with_capacity(headers.keys_len());
        for (name, value) in headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            match flat.get_mut(name.as_str()) {
                Some(joined) => {
                    joined.push_str(", ");
                    joined.push_str(&value);
                }
                None => {
                    flat.insert(name.to_string(), value.into_owned());
                }
            }
        }
        flat
    }

    async fn execute(&self, request: Request) -> Result<Response<Bytes>> {
        let options = request.transport_options().cloned().unwrap_or_default();
        let timeout = options.timeout().unwrap_or(self.config.timeout);
        let hyper_request = Self::build_hyper_request(request, &options)?;

        // The deadline covers the response head and the whole body.
        tokio::time::timeout(timeout, self.send(hyper_request))
            .await
            .map_err(|_| Error::timeout())?
    }

    async fn send(&self, request: http::Request<Full<Bytes>>) -> Result<Response<Bytes>> {
        let response = self.inner.request(request).await.map_err(map_hyper_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::extract_headers(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(Response::new(status, response_headers, body))
    }
}

/// Classify a hyper failure by walking its source chain.
#[allow(clippy::needless_pass_by_value)]
fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
    classify(&err)
}

fn classify(err: &(dyn StdError + 'static)) -> Error {
    let mut chain = err.to_string();
    let mut timed_out = false;
    let mut source = err.source();
    while let Some(cause) = source {
        timed_out |= cause
            .downcast_ref::<io::Error>()
            .is_some_and(|io| io.kind() == io::ErrorKind::TimedOut);
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }

    // Connect deadlines surface as an I/O timeout under the connector error.
    if timed_out {
        return Error::timeout();
    }

    let lowered = chain.to_ascii_lowercase();

    if lowered.contains("dns") || lowered.contains("lookup") {
        return Error::dns(chain);
    }

    if lowered.contains("ssl") || lowered.contains("tls") || lowered.contains("certificate") {
        return Error::tls(chain);
    }

    Error::connection(chain)
}

impl Service<Request> for HyperAdapter {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let adapter = self.clone();
        Box::pin(async move { adapter.execute(request).await })
    }
}
