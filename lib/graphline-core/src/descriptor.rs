//! Logical request descriptions.
//!
//! A [`RequestDescriptor`] says *what* to call (verb, server, path, params,
//! options, JSON flag) without committing to a wire format. The dispatcher
//! picks the encoding from [`RequestDescriptor::encoding`].
//!
//! # Example
//!
//! ```
//! use graphline_core::{EncodingPath, RequestDescriptor, UploadableValue, Verb};
//!
//! let descriptor = RequestDescriptor::builder(Verb::Post, "me/photos")
//!     .param("caption", "sunset")
//!     .param("source", UploadableValue::from_bytes(vec![0xFF, 0xD8]).with_filename("sunset.jpg"))
//!     .build()
//!     .expect("descriptor");
//!
//! assert_eq!(descriptor.url().expect("url").as_str(), "https://graph.facebook.com/me/photos");
//! assert_eq!(descriptor.encoding(), EncodingPath::Multipart);
//! ```

use url::Url;

use crate::{Options, ParamValue, Params, Result, ServerConfig, ServerRole, Verb};

/// Wire encoding chosen for a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingPath {
    /// GET: parameters in the URL query string.
    Query,
    /// Whole mapping as one JSON object body.
    Json,
    /// `multipart/form-data` body, because at least one value is an upload.
    Multipart,
    /// `application/x-www-form-urlencoded` body.
    UrlEncoded,
}

/// A logical request: verb, server, path, params, options.
///
/// Owned by one call and consumed when dispatched.
#[derive(Debug)]
pub struct RequestDescriptor {
    verb: Verb,
    server: Url,
    path: String,
    params: Params,
    options: Options,
    json: bool,
}

/// A descriptor taken apart for dispatch.
#[derive(Debug)]
pub struct DescriptorParts {
    /// HTTP verb.
    pub verb: Verb,
    /// Absolute request URL (server joined with path).
    pub url: Url,
    /// Path as given by the caller.
    pub path: String,
    /// Parameter mapping.
    pub params: Params,
    /// Per-request options.
    pub options: Options,
    /// Wire encoding.
    pub encoding: EncodingPath,
}

impl RequestDescriptor {
    /// Start a descriptor for `verb` on `path`.
    #[must_use]
    pub fn builder(verb: Verb, path: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(verb, path)
    }

    /// HTTP verb.
    #[must_use]
    pub const fn verb(&self) -> Verb {
        self.verb
    }

    /// Base server URL.
    #[must_use]
    pub fn server(&self) -> &Url {
        &self.server
    }

    /// Request path, relative to the server.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parameters.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Per-request options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Whether the caller asked for a JSON body.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }

    /// Absolute URL: the server with the path appended.
    ///
    /// A leading `/` on the path is optional; any path already on the server
    /// URL is kept.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the joined URL does not parse.
    pub fn url(&self) -> Result<Url> {
        join(&self.server, &self.path)
    }

    /// Encoding the dispatcher will use.
    ///
    /// JSON wins for any non-GET request flagged JSON. Otherwise GET uses the
    /// query string, and other verbs use multipart if any value is an upload,
    /// URL-encoded form otherwise.
    #[must_use]
    pub fn encoding(&self) -> EncodingPath {
        if !self.verb.is_get() && self.json {
            EncodingPath::Json
        } else if self.verb.is_get() {
            EncodingPath::Query
        } else if self.params.has_uploads() {
            EncodingPath::Multipart
        } else {
            EncodingPath::UrlEncoded
        }
    }

    /// Take the descriptor apart for dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the joined URL does not parse.
    pub fn into_parts(self) -> Result<DescriptorParts> {
        let url = self.url()?;
        let encoding = self.encoding();
        Ok(DescriptorParts {
            verb: self.verb,
            url,
            path: self.path,
            params: self.params,
            options: self.options,
            encoding,
        })
    }
}

fn join(server: &Url, path: &str) -> Result<Url> {
    let base = server.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Url::parse(&format!("{base}/{path}")).map_err(Into::into)
}

#[derive(Debug)]
enum ServerSource {
    Explicit(Url),
    Resolved(ServerConfig, ServerRole),
}

/// Builder for [`RequestDescriptor`].
///
/// Without an explicit server, the Graph host of [`ServerConfig::default`]
/// is resolved against the descriptor's own options at [`build`](Self::build).
#[derive(Debug)]
pub struct RequestDescriptorBuilder {
    verb: Verb,
    path: String,
    server: ServerSource,
    params: Params,
    options: Options,
    json: bool,
}

impl RequestDescriptorBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(verb: Verb, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
            server: ServerSource::Resolved(ServerConfig::default(), ServerRole::Graph),
            params: Params::new(),
            options: Options::new(),
            json: false,
        }
    }

    /// Use a fixed server URL.
    #[must_use]
    pub fn server(mut self, server: Url) -> Self {
        self.server = ServerSource::Explicit(server);
        self
    }

    /// Resolve the server from a table and a role, honoring the `use_ssl`,
    /// `beta` and `video` options.
    #[must_use]
    pub fn resolve_server(mut self, config: &ServerConfig, role: ServerRole) -> Self {
        self.server = ServerSource::Resolved(config.clone(), role);
        self
    }

    /// Add one parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Add every parameter of a mapping.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params.extend(params);
        self
    }

    /// Set one option.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key, value);
        self
    }

    /// Layer `options` over the ones already set.
    #[must_use]
    pub fn options(mut self, options: &Options) -> Self {
        self.options = options.merged_over(&self.options);
        self
    }

    /// Send the parameters as a JSON body (ignored for GET).
    #[must_use]
    pub const fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Builds the [`RequestDescriptor`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if the server cannot be resolved.
    pub fn build(self) -> Result<RequestDescriptor> {
        let server = match self.server {
            ServerSource::Explicit(url) => url,
            ServerSource::Resolved(config, role) => config.resolve(role, &self.options)?,
        };

        Ok(RequestDescriptor {
            verb: self.verb,
            server,
            path: self.path,
            params: self.params,
            options: self.options,
            json: self.json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UploadableValue;

    fn descriptor(builder: RequestDescriptorBuilder) -> RequestDescriptor {
        builder.build().expect("descriptor")
    }

    #[test]
    fn path_is_joined_with_or_without_leading_slash() {
        let with_slash = descriptor(RequestDescriptor::builder(Verb::Get, "/me"));
        let without = descriptor(RequestDescriptor::builder(Verb::Get, "me"));

        assert_eq!(with_slash.url().expect("url").as_str(), "https://graph.facebook.com/me");
        assert_eq!(with_slash.url().expect("url"), without.url().expect("url"));
    }

    #[test]
    fn server_path_prefix_is_kept() {
        let server = Url::parse("http://127.0.0.1:8080/v2.0/").expect("url");
        let descriptor = descriptor(RequestDescriptor::builder(Verb::Get, "me/feed").server(server));
        assert_eq!(
            descriptor.url().expect("url").as_str(),
            "http://127.0.0.1:8080/v2.0/me/feed"
        );
    }

    #[test]
    fn options_steer_server_resolution() {
        let descriptor = descriptor(
            RequestDescriptor::builder(Verb::Post, "me/videos")
                .option("video", true)
                .option("use_ssl", false),
        );
        assert_eq!(descriptor.server().as_str(), "http://graph-video.facebook.com/");
    }

    #[test]
    fn dialog_role() {
        let descriptor = descriptor(
            RequestDescriptor::builder(Verb::Get, "dialog/oauth")
                .resolve_server(&ServerConfig::default(), ServerRole::Dialog),
        );
        assert_eq!(
            descriptor.url().expect("url").as_str(),
            "https://www.facebook.com/dialog/oauth"
        );
    }

    #[test]
    fn encoding_selection() {
        let get = descriptor(RequestDescriptor::builder(Verb::Get, "me").param("a", 1).json(true));
        assert_eq!(get.encoding(), EncodingPath::Query);

        let json = descriptor(
            RequestDescriptor::builder(Verb::Post, "me/feed")
                .param("message", "hi")
                .json(true),
        );
        assert_eq!(json.encoding(), EncodingPath::Json);

        let form = descriptor(RequestDescriptor::builder(Verb::Delete, "123").param("a", 1));
        assert_eq!(form.encoding(), EncodingPath::UrlEncoded);

        let multipart = descriptor(
            RequestDescriptor::builder(Verb::Put, "me/photos")
                .param("caption", "x")
                .param("source", UploadableValue::from_bytes("img")),
        );
        assert_eq!(multipart.encoding(), EncodingPath::Multipart);
    }

    #[test]
    fn json_flag_beats_uploads() {
        let descriptor = descriptor(
            RequestDescriptor::builder(Verb::Post, "me/photos")
                .param("source", UploadableValue::from_bytes("img"))
                .json(true),
        );
        assert_eq!(descriptor.encoding(), EncodingPath::Json);
    }

    #[test]
    fn options_merge_over_existing() {
        let descriptor = descriptor(
            RequestDescriptor::builder(Verb::Get, "me")
                .option("beta", false)
                .options(&Options::new().with("beta", true).with("proxy", "p")),
        );
        assert_eq!(descriptor.options().flag("beta"), Some(true));
        assert!(descriptor.options().get("proxy").is_some());
    }

    #[test]
    fn into_parts_carries_encoding() {
        let parts = descriptor(RequestDescriptor::builder(Verb::Post, "me/feed").param("a", 1))
            .into_parts()
            .expect("parts");
        assert_eq!(parts.verb, Verb::Post);
        assert_eq!(parts.encoding, EncodingPath::UrlEncoded);
        assert_eq!(parts.params.len(), 1);
    }
}
