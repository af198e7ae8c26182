//! Opt-in retry policy for database requests.

use std::future;

use bytes::Bytes;
use tower::retry::Policy;

use crate::{Error, Request, Response};

/// Retry policy for [`tower::retry::RetryLayer`].
///
/// Retries connection errors, timeouts, 5xx answers, `408 Request Timeout`
/// and `429 Too Many Requests`. `POST` requests are left alone unless
/// [`RetryPolicy::with_post`] is set, because `POST` may create documents;
/// view queries with a key list are the `POST`s that are safe to repeat.
///
/// # Example
///
/// ```ignore
/// use couchwarm::HyperClient;
/// use couchwarm::middleware::{RetryLayer, RetryPolicy};
///
/// let client = HyperClient::builder()
///     .layer(RetryLayer::new(RetryPolicy::new(3).with_post()))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    remaining: u32,
    retry_post: bool,
}

impl RetryPolicy {
    /// Create a new retry policy with the given maximum number of retries.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            remaining: max_retries,
            retry_post: false,
        }
    }

    /// Also retry `POST` requests.
    #[must_use]
    pub fn with_post(mut self) -> Self {
        self.retry_post = true;
        self
    }

    fn should_retry_response(response: &Response<Bytes>) -> bool {
        let status = response.status();
        status >= 500 || status == 408 || status == 429
    }

    fn should_retry_error(error: &Error) -> bool {
        error.is_connection() || error.is_timeout()
    }

    fn may_repeat(&self, request: &Request<Bytes>) -> bool {
        request.method().is_idempotent() || self.retry_post
    }
}

impl Policy<Request<Bytes>, Response<Bytes>, Error> for RetryPolicy {
    type Future = future::Ready<()>;

    fn retry(
        &mut self,
        req: &mut Request<Bytes>,
        result: &mut Result<Response<Bytes>, Error>,
    ) -> Option<Self::Future> {
        if self.remaining == 0 || !self.may_repeat(req) {
            return None;
        }

        let should_retry = match result {
            Ok(response) => Self::should_retry_response(response),
            Err(error) => Self::should_retry_error(error),
        };

        if should_retry {
            self.remaining -= 1;
            tracing::debug!(remaining = self.remaining, url = %req.url(), "retrying request");
            Some(future::ready(()))
        } else {
            None
        }
    }

    fn clone_request(&mut self, req: &Request<Bytes>) -> Option<Request<Bytes>> {
        Some(req.clone())
    }
}
