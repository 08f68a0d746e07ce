//! Transport trait.
//!
//! [`HttpTransport`] is the seam between the dispatcher and whatever actually
//! sends bytes: the runtime's `TransportPipeline` implements it, and so can a
//! test double.

use std::future::Future;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Executes one request and returns the raw response.
pub trait HttpTransport: Send + Sync {
    /// Execute a request.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails before sending, or if the network
    /// layer fails. A non-2xx status is not an error.
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}
