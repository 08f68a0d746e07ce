//! Configuration types.
//!
//! - [`AdapterConfig`] tunes the network adapter (timeouts, connection pool).
//! - [`ServiceConfig`] is what a [`Dispatcher`](crate::Dispatcher) is built
//!   from: the server table and the default options merged under every call.
//!
//! Both are meant to be built once at startup and then only read.

use std::time::Duration;

use graphline_core::{Options, ServerConfig};

/// Settings of the [`HyperAdapter`](crate::HyperAdapter).
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Deadline per request unless the call carries `request.timeout`.
    pub timeout: Duration,
    /// TCP connect deadline.
    pub connect_timeout: Duration,
    /// Idle keep-alive connections kept per host.
    pub pool_idle_per_host: usize,
    /// How long an idle connection stays pooled.
    pub pool_idle_timeout: Duration,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl AdapterConfig {
    /// Overall deadline for one request, including reading the body.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// TCP connect deadline.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Idle connections kept per host.
    #[must_use]
    pub const fn with_pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = count;
        self
    }

    /// Idle connection lifetime.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }
}

/// Process-level settings of a dispatcher.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Server table used to resolve hosts.
    pub servers: ServerConfig,
    /// Options every request starts from; per-request options win.
    pub default_options: Options,
}

impl ServiceConfig {
    /// Replace the server table.
    #[must_use]
    pub fn with_servers(mut self, servers: ServerConfig) -> Self {
        self.servers = servers;
        self
    }

    /// Replace the default options.
    #[must_use]
    pub fn with_default_options(mut self, options: Options) -> Self {
        self.default_options = options;
        self
    }
}
