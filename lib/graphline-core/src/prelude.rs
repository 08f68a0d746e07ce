//! Prelude module for convenient imports.
//!
//! ```ignore
//! use graphline_core::prelude::*;
//! ```

pub use crate::{
    Body, ContentType, EncodingPath, Error, HttpTransport, MultipartBuilder, Options, ParamValue,
    Params, Request, RequestDescriptor, Response, Result, ServerConfig, ServerRole,
    TransportOptions, UploadableValue, Verb, encode_params,
};
