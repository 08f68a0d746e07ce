//! Transport pipeline: a tower middleware chain ending in a network adapter.
//!
//! The default chain is
//!
//! ```text
//! caller layers -> MultipartEncoderLayer -> UrlEncodedLayer -> HyperAdapter
//! ```
//!
//! A built [`TransportPipeline`] is immutable. Cloning it is cheap and every
//! clone shares the same chain, so one pipeline can serve concurrent calls.
//!
//! # Example
//!
//! ```ignore
//! use graphline::{TransportPipeline, middleware::LoggingLayer};
//! use std::time::Duration;
//!
//! let pipeline = TransportPipeline::builder()
//!     .timeout(Duration::from_secs(10))
//!     .with_logging()
//!     .build();
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_service::Service;

use graphline_core::{Error, HttpTransport, Request, Response, Result};

use crate::{
    AdapterConfig, HyperAdapter,
    middleware::{LoggingLayer, MultipartEncoderLayer, UrlEncodedLayer},
};

/// Type-erased service for middleware composition.
pub type BoxedService = BoxCloneService<Request, Response<Bytes>, Error>;

/// Future type for the pipeline's tower services.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// Makes a [`BoxedService`] shareable: each call clones the service out of
/// the lock, releases it, then waits for the clone to be ready.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request) -> ServiceFuture {
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.ready().await?.call(request).await })
    }
}

/// An immutable middleware chain terminating in a network adapter.
#[derive(Clone)]
pub struct TransportPipeline {
    service: SyncService,
    encoders: bool,
    layers: usize,
}

impl std::fmt::Debug for TransportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportPipeline")
            .field("encoders", &self.encoders)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

impl TransportPipeline {
    /// The default chain over a [`HyperAdapter`] with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new pipeline builder.
    #[must_use]
    pub fn builder() -> TransportPipelineBuilder {
        TransportPipelineBuilder::default()
    }

    /// Returns `true` if the built-in body encoders are part of the chain.
    #[must_use]
    pub const fn has_encoders(&self) -> bool {
        self.encoders
    }

    /// Number of caller-supplied layers.
    #[must_use]
    pub const fn layer_count(&self) -> usize {
        self.layers
    }
}

impl Default for TransportPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for TransportPipeline {
    async fn execute(&self, request: Request) -> Result<Response<Bytes>> {
        self.service.call(request).await
    }
}

impl Service<Request> for TransportPipeline {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.service.call(request)
    }
}

/// Builder for [`TransportPipeline`].
pub struct TransportPipelineBuilder {
    config: AdapterConfig,
    layers: Vec<LayerFn>,
    adapter: Option<BoxedService>,
    encoders: bool,
}

impl Default for TransportPipelineBuilder {
    fn default() -> Self {
        Self {
            config: AdapterConfig::default(),
            layers: Vec::new(),
            adapter: None,
            encoders: true,
        }
    }
}

impl std::fmt::Debug for TransportPipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportPipelineBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .field("custom_adapter", &self.adapter.is_some())
            .field("encoders", &self.encoders)
            .finish()
    }
}

impl TransportPipelineBuilder {
    // ========================================================================
    // Adapter Configuration
    // ========================================================================

    /// Set the request timeout of the default adapter.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Set the connection timeout of the default adapter.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host of the default adapter.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.with_pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout of the default adapter.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_pool_idle_timeout(timeout);
        self
    }

    /// Replace the whole default adapter configuration.
    #[must_use]
    pub fn adapter_config(mut self, config: &AdapterConfig) -> Self {
        self.config = config.clone();
        self
    }

    // ========================================================================
    // Chain Composition
    // ========================================================================

    /// Add a middleware layer.
    ///
    /// Layers run in the order they are added, all before the body encoders.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service:
            Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Alias for [`layer`](Self::layer).
    #[must_use]
    pub fn with<L>(self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service:
            Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layer(layer)
    }

    /// Replace the network adapter with any tower service.
    #[must_use]
    pub fn adapter<S>(mut self, adapter: S) -> Self
    where
        S: Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
        S::Future: Send,
    {
        self.adapter = Some(BoxCloneService::new(adapter));
        self
    }

    /// Drop the built-in body encoders from the chain.
    ///
    /// The caller's layers are then responsible for turning parameter bodies
    /// into bytes; one that reaches the adapter unencoded fails with
    /// [`Error::Encoding`].
    #[must_use]
    pub const fn without_encoders(mut self) -> Self {
        self.encoders = false;
        self
    }

    /// Add summary request logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add detailed request logging.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Build the pipeline.
    #[must_use]
    pub fn build(self) -> TransportPipeline {
        let config = self.config;
        let mut service = self
            .adapter
            .unwrap_or_else(|| BoxCloneService::new(HyperAdapter::new(config)));

        if self.encoders {
            service = BoxCloneService::new(UrlEncodedLayer::new().layer(service));
            service = BoxCloneService::new(MultipartEncoderLayer::new().layer(service));
        }

        let layers = self.layers.len();
        // Wrap from the last added inwards so the first added runs first.
        for layer_fn in self.layers.iter().rev() {
            service = layer_fn(service);
        }

        TransportPipeline {
            service: SyncService::new(service),
            encoders: self.encoders,
            layers,
        }
    }
}
