//! Error types for couchwarm.
//!
//! Failures are a closed set of variants on [`Error`]. The structured kinds
//! coming from the database ([`RequestError`], [`BulkError`] and the
//! response decode failure) all expose a message and their diagnostic fields
//! through the [`Describe`] trait.

use std::fmt;

use bytes::Bytes;
use derive_more::{Display, Error, From};
use url::Url;

use crate::{Request, Response, ViewTask};

// ============================================================================
// Describe
// ============================================================================

/// A failure that can describe itself with a message and an optional HTTP status.
pub trait Describe {
    /// Human readable summary of the failure.
    fn message(&self) -> String;

    /// HTTP status code the failure is tied to, if any.
    fn http_status(&self) -> Option<u16>;
}

// ============================================================================
// Request Error
// ============================================================================

/// The database answered with a status of 400 or above.
///
/// Keeps the request that was sent and the buffered response so the failing
/// call can be diagnosed after the fact.
#[derive(Debug, Display, Error)]
#[display("{message}")]
pub struct RequestError {
    message: String,
    status: u16,
    request: Request<Bytes>,
    response: Response<Bytes>,
}

impl RequestError {
    /// Build the error for `response`, which answered `request`.
    ///
    /// The message embeds the status code and the trimmed response body.
    #[must_use]
    pub fn new(request: Request<Bytes>, response: Response<Bytes>) -> Self {
        let status = response.status();
        let message = format!(
            "HTTP request failed with code {status}: {}",
            response.trimmed_text()
        );
        Self {
            message,
            status,
            request,
            response,
        }
    }

    /// Error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status code of the response.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.status
    }

    /// The request that failed.
    #[must_use]
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    /// The raw response.
    #[must_use]
    pub fn response(&self) -> &Response<Bytes> {
        &self.response
    }
}

impl Describe for RequestError {
    fn message(&self) -> String {
        self.message.clone()
    }

    fn http_status(&self) -> Option<u16> {
        Some(self.status)
    }
}

// ============================================================================
// Bulk Error
// ============================================================================

/// Some documents of a multi-document write were rejected.
///
/// Each entry of `item_errors` is the per-document result reported by the
/// database (`{"id", "error", "reason"}`).
#[derive(Debug)]
pub struct BulkError {
    message: String,
    database_url: Url,
    item_errors: Vec<serde_json::Value>,
    request_body: serde_json::Value,
}

impl BulkError {
    /// Build a bulk error for a write against `database_url`.
    #[must_use]
    pub fn new(
        database_url: Url,
        item_errors: Vec<serde_json::Value>,
        request_body: serde_json::Value,
    ) -> Self {
        Self {
            message: "Bulk Errors".to_string(),
            database_url,
            item_errors,
            request_body,
        }
    }

    /// Error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// URL of the database the write targeted.
    #[must_use]
    pub fn database_url(&self) -> &Url {
        &self.database_url
    }

    /// Per-document failures.
    #[must_use]
    pub fn item_errors(&self) -> &[serde_json::Value] {
        &self.item_errors
    }

    /// The body that was sent.
    #[must_use]
    pub fn request_body(&self) -> &serde_json::Value {
        &self.request_body
    }
}

impl fmt::Display for BulkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} item(s) rejected by {})",
            self.message,
            self.item_errors.len(),
            self.database_url
        )
    }
}

impl std::error::Error for BulkError {}

impl Describe for BulkError {
    fn message(&self) -> String {
        self.to_string()
    }

    fn http_status(&self) -> Option<u16> {
        None
    }
}

// ============================================================================
// Warmup Failure
// ============================================================================

/// One or more warmup queries failed.
#[derive(Debug)]
pub struct WarmupFailure {
    total: usize,
    failures: Vec<(ViewTask, Error)>,
}

impl WarmupFailure {
    /// Aggregate `failures` out of `total` dispatched queries.
    #[must_use]
    pub fn new(total: usize, failures: Vec<(ViewTask, Error)>) -> Self {
        Self { total, failures }
    }

    /// Number of warmup queries dispatched.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Number of warmup queries that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// The failed views with their error.
    #[must_use]
    pub fn failures(&self) -> &[(ViewTask, Error)] {
        &self.failures
    }
}

impl fmt::Display for WarmupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} warmup queries failed",
            self.failures.len(),
            self.total
        )
    }
}

impl std::error::Error for WarmupFailure {}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for couchwarm operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The database answered with a status of 400 or above.
    #[display("{_0}")]
    #[from(skip)]
    Request(#[error(not(source))] Box<RequestError>),

    /// A multi-document write partially failed.
    #[display("{_0}")]
    #[from(skip)]
    Bulk(#[error(not(source))] Box<BulkError>),

    /// A successful response whose body is not the expected JSON.
    #[display("could not decode response at '{path}': {message}")]
    #[from(skip)]
    ResponseDecode {
        /// Status of the response, when the body came from one.
        status: Option<u16>,
        /// JSON path to the error (e.g. `rows[0].key`).
        path: String,
        /// Error message.
        message: String,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// Warmup queries failed and the failure policy asked to report them as an error.
    #[display("{_0}")]
    #[from(skip)]
    Warmup(#[error(not(source))] WarmupFailure),

    /// A background task panicked or was cancelled before answering.
    #[display("task did not complete: {_0}")]
    #[from(skip)]
    Task(#[error(not(source))] String),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl From<RequestError> for Error {
    fn from(error: RequestError) -> Self {
        Self::Request(Box::new(error))
    }
}

impl From<BulkError> for Error {
    fn from(error: BulkError) -> Self {
        Self::Bulk(Box::new(error))
    }
}

impl From<WarmupFailure> for Error {
    fn from(failure: WarmupFailure) -> Self {
        Self::Warmup(failure)
    }
}

impl Error {
    /// Create a response decode error.
    #[must_use]
    pub fn response_decode(
        status: Option<u16>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ResponseDecode {
            status,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a task error.
    #[must_use]
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task(message.into())
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// The [`RequestError`] behind this error, if any.
    #[must_use]
    pub fn as_request_error(&self) -> Option<&RequestError> {
        match self {
            Self::Request(error) => Some(error),
            _ => None,
        }
    }

    /// Returns the HTTP status code tied to this error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(error) => Some(error.http_status_code()),
            Self::ResponseDecode { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` if the database answered 4xx.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.as_request_error()
            .is_some_and(|e| (400..500).contains(&e.http_status_code()))
    }

    /// Returns `true` if the database answered 5xx.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.as_request_error()
            .is_some_and(|e| e.http_status_code() >= 500)
    }

    /// Returns `true` if the database answered 404 Not Found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.as_request_error()
            .is_some_and(|e| e.http_status_code() == 404)
    }
}

impl Describe for Error {
    fn message(&self) -> String {
        match self {
            Self::Request(error) => error.message().to_string(),
            Self::Bulk(error) => Describe::message(error.as_ref()),
            other => other.to_string(),
        }
    }

    fn http_status(&self) -> Option<u16> {
        self.status()
    }
}
