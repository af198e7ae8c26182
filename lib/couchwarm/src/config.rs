//! Client configuration types.

use std::time::Duration;

/// Connection limit meaning "no limit": every request gets its own socket
/// as soon as it is issued.
///
/// This is the default, and what a warmup run uses when it builds its own
/// client, so that all warmup queries hit the database as one burst.
pub const UNBOUNDED_CONNECTION_LIMIT: usize = usize::MAX;

/// Configuration for the HTTP client.
///
/// There is no request timeout by default: the first query on a view builds
/// its index, which can take minutes on a large database.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for one request, from send to fully read body. `None` waits forever.
    pub timeout: Option<Duration>,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Maximum number of requests in flight at once.
    pub max_connections: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            max_connections: UNBOUNDED_CONNECTION_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Whether `max_connections` caps concurrent requests.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.max_connections != UNBOUNDED_CONNECTION_LIMIT
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Give up on requests that take longer than `timeout`.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the TCP connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Cap the number of requests in flight. `0` is treated as `1`.
    #[must_use]
    pub const fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = if count == 0 { 1 } else { count };
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
