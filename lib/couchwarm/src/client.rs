//! Pooled HTTP transport built on hyper-util.
//!
//! [`HyperClient`] is the connection pool shared by every request issued
//! from one [`crate::Database`]. Cloning it is cheap and shares the pool.

use std::collections::HashMap;
use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{self, Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tower::Layer;
use tower::limit::ConcurrencyLimitLayer;
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::connector::connector;
use crate::{Error, Request, Response, Result};

#[cfg(feature = "middleware-logging")]
use crate::middleware::LoggingLayer;
#[cfg(feature = "middleware-retry")]
use crate::middleware::RetryPolicy;
#[cfg(feature = "middleware-retry")]
use tower::retry::RetryLayer;

/// How long an idle pooled connection is kept.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// The layered service stack, type-erased.
pub type BoxedService = BoxCloneService<Request<Bytes>, Response<Bytes>, Error>;

/// Future type for Tower Service implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

type LayerFn = Box<dyn FnOnce(BoxedService) -> BoxedService + Send>;

// ============================================================================
// Transport
// ============================================================================

/// One hop to the database: hyper request out, buffered response in.
#[derive(Clone)]
struct Transport {
    pool: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Option<Duration>,
}

impl Transport {
    fn new(config: &ClientConfig) -> Self {
        let pool = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build(connector(config));
        Self {
            pool,
            timeout: config.timeout,
        }
    }

    async fn send(self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let exchange = self.exchange(request);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| Error::Timeout)?,
            None => exchange.await,
        }
    }

    /// Send and read the whole body; the timeout covers both.
    async fn exchange(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let (method, url, headers, body) = request.into_parts();

        let outgoing = headers
            .iter()
            .fold(
                http::Request::builder()
                    .method(http::Method::from(method))
                    .uri(url.as_str()),
                |builder, (name, value)| builder.header(name.as_str(), value.as_str()),
            )
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|e| Error::invalid_request(e.to_string()))?;

        let (parts, incoming) = self
            .pool
            .request(outgoing)
            .await
            .map_err(|e| transport_error(&e))?
            .into_parts();

        let body = incoming
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        let headers: HashMap<String, String> = parts
            .headers
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
            .collect();

        Ok(Response::new(parts.status.as_u16(), headers, body))
    }
}

/// TLS failures are found by walking the source chain for a rustls error.
fn transport_error(error: &legacy::Error) -> Error {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(current) = cause {
        let is_tls = current.is::<rustls::Error>()
            || current
                .downcast_ref::<std::io::Error>()
                .and_then(std::io::Error::get_ref)
                .is_some_and(|inner| inner.is::<rustls::Error>());
        if is_tls {
            return Error::tls(error.to_string());
        }
        cause = current.source();
    }
    Error::connection(error.to_string())
}

impl Service<Request<Bytes>> for Transport {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        Box::pin(self.clone().send(request))
    }
}

// ============================================================================
// Public Client
// ============================================================================

/// HTTP client using hyper-util with connection pooling, TLS, and middleware support.
///
/// # Example
///
/// ```ignore
/// use couchwarm::HyperClient;
/// use std::time::Duration;
///
/// // Unbounded pool, no timeout, no middleware
/// let client = HyperClient::new();
///
/// // At most 8 requests in flight, 5 minutes per request, with request logging
/// let client = HyperClient::builder()
///     .max_connections(8)
///     .timeout(Duration::from_secs(300))
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    // `BoxCloneService` is not `Sync`; each call clones the stack out of the mutex.
    stack: Arc<Mutex<BoxedService>>,
    config: ClientConfig,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Client with the default configuration: unbounded pool, no timeout, no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Client with a custom configuration and no middleware.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        Self::assemble(config, Vec::new())
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Get the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Transport, then the connection cap, then `layers` from innermost to outermost.
    fn assemble(config: ClientConfig, layers: Vec<LayerFn>) -> Self {
        let transport = Transport::new(&config);
        let base = if config.is_bounded() {
            BoxCloneService::new(ConcurrencyLimitLayer::new(config.max_connections).layer(transport))
        } else {
            BoxCloneService::new(transport)
        };
        let stack = layers.into_iter().fold(base, |service, layer| layer(service));

        Self {
            stack: Arc::new(Mutex::new(stack)),
            config,
        }
    }

    fn dispatch(&self, request: Request<Bytes>) -> ServiceFuture {
        let mut service = self
            .stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(async move {
            // A bounded stack is only ready once a slot frees up.
            poll_fn(|cx| service.poll_ready(cx)).await?;
            service.call(request).await
        })
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl couchwarm_core::HttpClient for HyperClient {
    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.dispatch(request).await
    }
}

impl Service<Request<Bytes>> for HyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        // Readiness of the stack is awaited inside `dispatch`.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        self.dispatch(request)
    }
}

/// Builder for [`HyperClient`].
///
/// Nothing is added implicitly: no timeout, no retry, no logging unless asked for.
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    layers: Vec<LayerFn>,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    /// Give up on requests that take longer than `timeout`.
    ///
    /// Keep it generous for warmups: an index build answers only when done.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Cap the number of requests in flight.
    #[must_use]
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config = self.config.max_connections(count);
        self
    }

    /// Add a Tower layer to the client.
    ///
    /// Layers are applied in order: first added = innermost.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + 'static,
        L::Service: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request<Bytes>>>::Future: Send,
    {
        self.layers
            .push(Box::new(move |service| BoxCloneService::new(layer.layer(service))));
        self
    }

    /// Retry transient failures up to `max_retries` times (see [`RetryPolicy`]).
    #[cfg(feature = "middleware-retry")]
    #[must_use]
    pub fn with_retry(self, max_retries: u32) -> Self {
        self.layer(RetryLayer::new(RetryPolicy::new(max_retries)))
    }

    /// Log each request with its status and duration.
    #[cfg(feature = "middleware-logging")]
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Like [`HyperClientBuilder::with_logging`], at debug level with (redacted) headers.
    #[cfg(feature = "middleware-logging")]
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> HyperClient {
        HyperClient::assemble(self.config.build(), self.layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_is_unbounded_without_timeout() {
        let client = HyperClient::new();
        assert_eq!(client.config().timeout, None);
        assert!(!client.config().is_bounded());
    }

    #[test]
    fn builder_sets_limits() {
        let client = HyperClient::builder()
            .timeout(Duration::from_secs(60))
            .max_connections(4)
            .build();

        assert_eq!(client.config().timeout, Some(Duration::from_secs(60)));
        assert_eq!(client.config().max_connections, 4);
    }

    #[test]
    fn client_is_debug() {
        let client = HyperClient::new();
        let debug = format!("{client:?}");
        assert!(debug.contains("HyperClient"));
    }

    #[test]
    fn builder_debug_counts_layers() {
        let builder = HyperClient::builder().layer(crate::middleware::LoggingLayer::new());
        assert!(format!("{builder:?}").contains("layers_count: 1"));
    }
}
