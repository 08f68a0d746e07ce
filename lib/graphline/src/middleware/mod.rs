//! Tower middleware for the transport pipeline.
//!
//! Every layer here wraps a `Service<Request, Response = Response<Bytes>,
//! Error = Error>` and can be stacked with
//! [`TransportPipelineBuilder::layer`](crate::TransportPipelineBuilder::layer).
//!
//! - [`MultipartEncoderLayer`] - encodes upload-carrying params as `multipart/form-data`
//! - [`UrlEncodedLayer`] - encodes remaining params as a URL-encoded form
//! - [`LoggingLayer`] - logs requests and responses using `tracing`
//!
//! The two encoders are part of the default chain. Anything else the caller
//! needs (authentication, retries, rate limiting) comes in as an extra layer:
//! the pipeline itself never retries.

mod logging;
mod multipart;
mod url_encoded;

pub use logging::{LogLevel, Logging, LoggingLayer};
pub use multipart::{MultipartEncoder, MultipartEncoderLayer};
pub use url_encoded::{UrlEncoded, UrlEncodedLayer};
