//! Tower middleware layers for the couchwarm HTTP client.
//!
//! Layers wrap the connection pool of a [`crate::HyperClient`] and see every
//! request a [`crate::Database`] sends. None is installed by default.
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `middleware-logging` | `.with_logging()` helper |
//! | `middleware-retry` | `.with_retry()` helper |
//! | `middleware-full` | All helpers |
//!
//! # Available Layers
//!
//! - [`LoggingLayer`] - Logs requests/responses using `tracing`
//! - [`RetryPolicy`] - Opt-in retry policy for [`RetryLayer`]
//! - [`ConcurrencyLimitLayer`] - Limits concurrent requests (also applied by
//!   `max_connections`)
//!
//! # Example
//!
//! ```ignore
//! use couchwarm::HyperClient;
//! use couchwarm::middleware::{LoggingLayer, RetryLayer, RetryPolicy};
//!
//! let client = HyperClient::builder()
//!     .layer(RetryLayer::new(RetryPolicy::new(3)))
//!     .layer(LoggingLayer::new())
//!     .build();
//! ```

mod logging;
mod retry;

pub use logging::{LogLevel, Logging, LoggingLayer};
pub use retry::RetryPolicy;

// Re-export tower types for convenience (always available)
pub use tower::{Layer, ServiceBuilder};

// Re-export tower middleware layers (always available)
pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::retry::RetryLayer;
