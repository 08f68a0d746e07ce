//! Pluggable HTTP transport for Facebook's Graph and REST endpoints.
//!
//! A [`Dispatcher`] takes a [`RequestDescriptor`] (verb, path, params,
//! options), picks the wire encoding, and sends it through a
//! [`TransportPipeline`]: a tower middleware chain ending in a network
//! adapter. The result is a [`Response<String>`] with status, body and
//! headers.
//!
//! # Example
//!
//! ```ignore
//! use graphline::{Dispatcher, UploadableValue, Verb};
//!
//! let dispatcher = Dispatcher::default();
//! let descriptor = dispatcher
//!     .request(Verb::Post, "me/photos")
//!     .param("caption", "sunset")
//!     .param("source", UploadableValue::from_path("sunset.jpg")?)
//!     .build()?;
//!
//! let response = dispatcher.make_request(descriptor).await?;
//! assert!(response.is_success());
//! ```

mod adapter;
mod config;
mod connector;
mod dispatcher;
pub mod middleware;
mod pipeline;
pub mod prelude;

pub use adapter::HyperAdapter;
pub use config::{AdapterConfig, ServiceConfig};
pub use dispatcher::Dispatcher;
pub use pipeline::{BoxedService, ServiceFuture, TransportPipeline, TransportPipelineBuilder};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use graphline_core::{
    Body, ContentType, DescriptorParts, EncodingPath, Error, HttpTransport, MultipartBody,
    MultipartBuilder, Options, ParamValue, Params, Request, RequestBuilder, RequestDescriptor,
    RequestDescriptorBuilder, Response, Result, ServerConfig, ServerRole, TRANSPORT_OPTION_KEYS,
    TransportError, TransportOptions, UploadableValue, Verb, encode_json, encode_params,
    from_json,
};

// Re-export http types for status codes and headers
pub use graphline_core::{StatusCode, header};
