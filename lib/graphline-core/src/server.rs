//! Facebook server table.
//!
//! Some Facebook services live on variant hosts: video uploads go to
//! `graph-video.facebook.com`, the beta tier to `graph.beta.facebook.com`.
//! [`ServerConfig`] derives those hosts by rewriting the part of the host that
//! matches `host_path_matcher`. When talking to a proxy such as
//! `graph.fbproxy.example.com`, set the matcher to `\.fbproxy` and the
//! replacements to `-video.fbproxy` / `.beta.fbproxy`.
//!
//! The table is meant to be configured once at startup and then only read.

use regex::Regex;
use url::Url;

use crate::{Error, Options, Result};

/// Default Graph API host.
pub const DEFAULT_GRAPH_SERVER: &str = "graph.facebook.com";
/// Default dialog host.
pub const DEFAULT_DIALOG_HOST: &str = "www.facebook.com";
/// Default pattern matched against hosts when switching tiers.
pub const DEFAULT_HOST_PATH_MATCHER: &str = r"\.facebook";
/// Default replacement for the video tier.
pub const DEFAULT_VIDEO_REPLACE: &str = "-video.facebook";
/// Default replacement for the beta tier.
pub const DEFAULT_BETA_REPLACE: &str = ".beta.facebook";

/// Logical server role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServerRole {
    /// Graph API host.
    #[default]
    Graph,
    /// Dialog (OAuth / UI) host.
    Dialog,
}

/// Hosts and tier rewriting rules.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    graph_server: String,
    dialog_host: String,
    host_path_matcher: Regex,
    video_replace: String,
    beta_replace: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            graph_server: DEFAULT_GRAPH_SERVER.to_string(),
            dialog_host: DEFAULT_DIALOG_HOST.to_string(),
            host_path_matcher: default_matcher(),
            video_replace: DEFAULT_VIDEO_REPLACE.to_string(),
            beta_replace: DEFAULT_BETA_REPLACE.to_string(),
        }
    }
}

#[allow(clippy::expect_used)]
fn default_matcher() -> Regex {
    Regex::new(DEFAULT_HOST_PATH_MATCHER).expect("default host matcher is a valid regex")
}

impl ServerConfig {
    /// The Facebook defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Graph API host.
    #[must_use]
    pub fn with_graph_server(mut self, host: impl Into<String>) -> Self {
        self.graph_server = host.into();
        self
    }

    /// Set the dialog host.
    #[must_use]
    pub fn with_dialog_host(mut self, host: impl Into<String>) -> Self {
        self.dialog_host = host.into();
        self
    }

    /// Set the pattern rewritten when switching to the video or beta tier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the pattern is not a valid regex.
    pub fn with_host_path_matcher(mut self, pattern: &str) -> Result<Self> {
        self.host_path_matcher = Regex::new(pattern)
            .map_err(|e| Error::config(format!("host path matcher '{pattern}': {e}")))?;
        Ok(self)
    }

    /// Set the video tier replacement.
    #[must_use]
    pub fn with_video_replace(mut self, replacement: impl Into<String>) -> Self {
        self.video_replace = replacement.into();
        self
    }

    /// Set the beta tier replacement.
    #[must_use]
    pub fn with_beta_replace(mut self, replacement: impl Into<String>) -> Self {
        self.beta_replace = replacement.into();
        self
    }

    /// Graph API host.
    #[must_use]
    pub fn graph_server(&self) -> &str {
        &self.graph_server
    }

    /// Dialog host.
    #[must_use]
    pub fn dialog_host(&self) -> &str {
        &self.dialog_host
    }

    /// Host for a role, before any tier rewriting.
    #[must_use]
    pub fn host(&self, role: ServerRole) -> &str {
        match role {
            ServerRole::Graph => &self.graph_server,
            ServerRole::Dialog => &self.dialog_host,
        }
    }

    /// Resolve the base URL for a role.
    ///
    /// - scheme is `https` unless the `use_ssl` option is `false`
    /// - the `video` option rewrites the host with the video replacement
    /// - the `beta` option then rewrites it with the beta replacement
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the resulting URL does not parse.
    pub fn resolve(&self, role: ServerRole, options: &Options) -> Result<Url> {
        let scheme = if options.flag("use_ssl") == Some(false) {
            "http"
        } else {
            "https"
        };

        let mut server = format!("{scheme}://{}", self.host(role));
        if options.flag("video") == Some(true) {
            server = self.rewrite(&server, &self.video_replace);
        }
        if options.flag("beta") == Some(true) {
            server = self.rewrite(&server, &self.beta_replace);
        }

        Url::parse(&server).map_err(Into::into)
    }

    fn rewrite(&self, server: &str, replacement: &str) -> String {
        self.host_path_matcher
            .replace_all(server, regex::NoExpand(replacement))
            .into_owned()
    }
}
