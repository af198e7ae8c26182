//! HTTP transport trait.
//!
//! [`HttpClient`] is the seam between the database handle and the network.
//! `couchwarm` ships a hyper-util implementation with a connection pool;
//! tests plug in an in-memory client instead.

use std::future::Future;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// Implementations send one request and return the response with its body
/// fully buffered. They must not classify the status code: a 404 is still an
/// `Ok` response at this level.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}
