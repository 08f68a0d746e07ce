//! Core types for the graphline Graph API transport.
//!
//! This crate holds everything that does not touch the network:
//! - [`Params`], [`ParamValue`] and [`UploadableValue`] - request parameters
//! - [`encode_params`] and [`encode_json`] - query string / form and JSON bodies
//! - [`MultipartBuilder`] - `multipart/form-data` bodies for uploads
//! - [`RequestDescriptor`] - a logical request and its [`EncodingPath`]
//! - [`ServerConfig`] - Facebook hosts and tier rewriting
//! - [`Options`] and [`TransportOptions`] - per-request knobs and their allow-list
//! - [`Request`], [`Response`] and [`HttpTransport`] - the pipeline seam
//! - [`Error`] and [`Result`] - error handling

mod body;
mod descriptor;
mod error;
mod multipart;
mod options;
mod params;
pub mod prelude;
mod request;
mod response;
mod server;
mod transport;
mod upload;
mod verb;

pub use body::{ContentType, encode_json, encode_params, from_json};
pub use descriptor::{DescriptorParts, EncodingPath, RequestDescriptor, RequestDescriptorBuilder};
pub use error::{Error, Result, TransportError};
pub use multipart::{MultipartBody, MultipartBuilder};
pub use options::{Options, TRANSPORT_OPTION_KEYS, TransportOptions};
pub use params::{ParamValue, Params};
pub use request::{Body, Request, RequestBuilder};
pub use response::Response;
pub use server::{
    DEFAULT_BETA_REPLACE, DEFAULT_DIALOG_HOST, DEFAULT_GRAPH_SERVER, DEFAULT_HOST_PATH_MATCHER,
    DEFAULT_VIDEO_REPLACE, ServerConfig, ServerRole,
};
pub use transport::HttpTransport;
pub use upload::{DEFAULT_FILENAME, UploadableValue, guess_content_type};
pub use verb::Verb;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
