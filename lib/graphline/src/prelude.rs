//! Prelude module for convenient imports.
//!
//! ```ignore
//! use graphline::prelude::*;
//! ```

pub use crate::{
    AdapterConfig, Dispatcher, Error, HttpTransport, Options, ParamValue, Params,
    RequestDescriptor, Response, Result, ServerConfig, ServerRole, ServiceConfig,
    TransportPipeline, UploadableValue, Verb,
};
