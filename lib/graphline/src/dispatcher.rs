//! Request dispatching.
//!
//! [`Dispatcher`] turns a [`RequestDescriptor`] into a pipeline [`Request`]:
//!
//! | verb / flags                  | parameters go to                          |
//! |-------------------------------|-------------------------------------------|
//! | non-GET with JSON flag        | one JSON object body                      |
//! | GET                           | URL query string                          |
//! | non-GET with an upload        | `multipart/form-data` body (pipeline)     |
//! | any other non-GET             | URL-encoded form body (pipeline)          |
//!
//! The response comes back normalized as a [`Response<String>`]. Transport
//! failures are returned as-is; nothing is retried and a non-2xx status is
//! not an error.

use tracing::debug;
use url::Url;

use graphline_core::{
    ContentType, EncodingPath, Error, HttpTransport, Request, RequestDescriptor,
    RequestDescriptorBuilder, Response, Result, ServerRole, UploadableValue, Verb, encode_json,
    encode_params, header,
};

use crate::{ServiceConfig, TransportPipeline};

/// Executes request descriptors through a transport pipeline.
///
/// # Example
///
/// ```ignore
/// use graphline::{Dispatcher, Verb};
///
/// let dispatcher = Dispatcher::default();
/// let descriptor = dispatcher
///     .request(Verb::Post, "me/feed")
///     .param("message", "Hello")
///     .build()?;
///
/// let response = dispatcher.make_request(descriptor).await?;
/// println!("{} {}", response.status(), response.body());
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: ServiceConfig,
    pipeline: TransportPipeline,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

impl Dispatcher {
    /// A dispatcher over the default pipeline.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_pipeline(config, TransportPipeline::new())
    }

    /// A dispatcher over an explicit pipeline.
    #[must_use]
    pub const fn with_pipeline(config: ServiceConfig, pipeline: TransportPipeline) -> Self {
        Self { config, pipeline }
    }

    /// Swap the default pipeline.
    ///
    /// Calls already in flight keep the pipeline they started with.
    pub fn set_pipeline(&mut self, pipeline: TransportPipeline) {
        self.pipeline = pipeline;
    }

    /// The default pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &TransportPipeline {
        &self.pipeline
    }

    /// The service configuration.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Start a descriptor against the configured Graph server, with the
    /// default options already applied.
    #[must_use]
    pub fn request(&self, verb: Verb, path: impl Into<String>) -> RequestDescriptorBuilder {
        self.request_to(ServerRole::Graph, verb, path)
    }

    /// Start a descriptor against the configured host for `role`.
    #[must_use]
    pub fn request_to(
        &self,
        role: ServerRole,
        verb: Verb,
        path: impl Into<String>,
    ) -> RequestDescriptorBuilder {
        RequestDescriptor::builder(verb, path)
            .options(&self.config.default_options)
            .resolve_server(&self.config.servers, role)
    }

    /// Execute a descriptor through the default pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the parameters cannot be encoded for the
    /// selected path (nothing is sent), or the transport error unchanged.
    pub async fn make_request(&self, descriptor: RequestDescriptor) -> Result<Response<String>> {
        self.make_request_with(descriptor, &self.pipeline).await
    }

    /// Execute a descriptor through an explicit transport for this call only.
    ///
    /// Once the response is in, the call is traced at debug level as
    /// `<VERB>: <path> params: ...`.
    ///
    /// # Errors
    ///
    /// Same as [`make_request`](Self::make_request).
    pub async fn make_request_with<T: HttpTransport>(
        &self,
        descriptor: RequestDescriptor,
        transport: &T,
    ) -> Result<Response<String>> {
        let summary = format!(
            "{}: {} params: {:?}",
            descriptor.verb(),
            descriptor.path(),
            descriptor.params()
        );
        let request = self.prepare(descriptor)?;
        let response = transport.execute(request).await?;
        debug!("{summary}");
        Ok(response.into_text())
    }

    /// Build the pipeline request for a descriptor.
    fn prepare(&self, descriptor: RequestDescriptor) -> Result<Request> {
        let parts = descriptor.into_parts()?;
        let options = parts.options.merged_over(&self.config.default_options);

        let builder =
            Request::builder(parts.verb, parts.url).transport_options(options.transport_options());

        let request = match parts.encoding {
            EncodingPath::Query => builder.query_string(&encode_params(&parts.params)?).build(),
            EncodingPath::Json => builder
                .header(header::CONTENT_TYPE.as_str(), ContentType::Json.as_str())
                .body(encode_json(&parts.params)?)
                .build(),
            EncodingPath::Multipart | EncodingPath::UrlEncoded => {
                builder.params(parts.params).build()
            }
        };
        Ok(request)
    }

    /// Download a remote file into an [`UploadableValue`].
    ///
    /// The content type comes from the response `Content-Type` header and
    /// the filename from the last URL path segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUploadSource`] on a transport failure or a
    /// non-2xx status.
    pub async fn fetch_upload(&self, url: Url) -> Result<UploadableValue> {
        let origin = url.to_string();
        let filename = url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
            .map(str::to_string);

        let request = Request::builder(Verb::Get, url).build();
        let response = self
            .pipeline
            .execute(request)
            .await
            .map_err(|e| Error::invalid_upload_source(&origin, e.to_string()))?;

        if !response.is_success() {
            return Err(Error::invalid_upload_source(
                origin,
                format!("HTTP status {}", response.status()),
            ));
        }

        let content_type = response
            .header(header::CONTENT_TYPE.as_str())
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .map(str::to_string);

        let mut upload = UploadableValue::from_bytes(response.into_body());
        if let Some(filename) = filename {
            upload = upload.with_filename(filename);
        }
        if let Some(content_type) = content_type {
            upload = upload.with_content_type(content_type);
        }
        Ok(upload)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use bytes::Bytes;
    use graphline_core::{Body, Options, UploadableValue};
    use serde_json::json;
    use tracing_test::traced_test;

    use super::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            ServiceConfig::default().with_default_options(Options::new().with("use_ssl", true)),
        )
    }

    #[test]
    fn get_params_go_to_query() {
        let dispatcher = dispatcher();
        let descriptor = dispatcher
            .request(Verb::Get, "me?fields=id")
            .param("b", "My String")
            .param("a", 2)
            .build()
            .expect("descriptor");

        let request = dispatcher.prepare(descriptor).expect("request");
        assert_eq!(
            request.url().as_str(),
            "https://graph.facebook.com/me?fields=id&a=2&b=My+String"
        );
        assert!(request.body().is_empty());
    }

    #[test]
    fn json_flag_builds_json_body() {
        let dispatcher = dispatcher();
        let descriptor = dispatcher
            .request(Verb::Post, "me/feed")
            .param("message", "hi")
            .param("targeting", json!({"countries": ["FR"]}))
            .json(true)
            .build()
            .expect("descriptor");

        let request = dispatcher.prepare(descriptor).expect("request");
        assert_eq!(request.header("content-type"), Some("application/json"));
        let Body::Bytes(body) = request.body() else {
            panic!("expected JSON body");
        };
        assert_eq!(
            body.as_ref(),
            br#"{"message":"hi","targeting":{"countries":["FR"]}}"#
        );
    }

    #[test]
    fn form_and_multipart_params_are_left_to_the_pipeline() {
        let dispatcher = dispatcher();
        let descriptor = dispatcher
            .request(Verb::Post, "me/photos")
            .param("source", UploadableValue::from_bytes("img"))
            .build()
            .expect("descriptor");

        let request = dispatcher.prepare(descriptor).expect("request");
        assert!(matches!(request.body(), Body::Params(params) if params.has_uploads()));
    }

    #[test]
    fn uploads_cannot_travel_as_json_or_query() {
        let dispatcher = dispatcher();

        let json = dispatcher
            .request(Verb::Post, "me/photos")
            .param("source", UploadableValue::from_bytes("img"))
            .json(true)
            .build()
            .expect("descriptor");
        assert!(dispatcher.prepare(json).expect_err("json upload").is_encoding());

        let get = dispatcher
            .request(Verb::Get, "me/photos")
            .param("source", UploadableValue::from_bytes("img"))
            .build()
            .expect("descriptor");
        assert!(dispatcher.prepare(get).expect_err("query upload").is_encoding());
    }

    #[test]
    fn only_allow_listed_options_are_attached() {
        let dispatcher = Dispatcher::new(
            ServiceConfig::default()
                .with_default_options(Options::new().with("proxy", "http://proxy:3128")),
        );
        let descriptor = dispatcher
            .request(Verb::Get, "me")
            .option("beta", true)
            .option("timeout_everything", 1)
            .option("headers", json!({"X-Trace": "1"}))
            .build()
            .expect("descriptor");

        let request = dispatcher.prepare(descriptor).expect("request");
        let options = request.transport_options().expect("options");
        let keys: Vec<&str> = options.keys().collect();
        assert_eq!(keys, vec!["headers", "proxy"]);
        assert_eq!(request.url().host_str(), Some("graph.beta.facebook.com"));
    }

    #[test]
    fn dialog_requests() {
        let dispatcher = dispatcher();
        let descriptor = dispatcher
            .request_to(ServerRole::Dialog, Verb::Get, "dialog/oauth")
            .param("client_id", "123")
            .build()
            .expect("descriptor");

        let request = dispatcher.prepare(descriptor).expect("request");
        assert_eq!(
            request.url().as_str(),
            "https://www.facebook.com/dialog/oauth?client_id=123"
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn call_is_traced_once_the_response_is_in() {
        let traced_early = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&traced_early);
        let adapter = tower::service_fn(move |_request: Request| {
            flag.store(logs_contain("POST: me/feed params:"), Ordering::SeqCst);
            async { Ok::<_, Error>(Response::new(200, HashMap::new(), Bytes::new())) }
        });
        let dispatcher = Dispatcher::with_pipeline(
            ServiceConfig::default(),
            TransportPipeline::builder().adapter(adapter).build(),
        );

        let descriptor = dispatcher
            .request(Verb::Post, "me/feed")
            .param("message", "hi")
            .build()
            .expect("descriptor");
        dispatcher.make_request(descriptor).await.expect("response");

        assert!(!traced_early.load(Ordering::SeqCst));
        assert!(logs_contain("POST: me/feed params:"));
    }
}
