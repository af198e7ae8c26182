//! Core types for the couchwarm CouchDB client.
//!
//! This crate holds everything that does not touch the network:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - the request sent for one call
//! - [`Response`] - a fully buffered HTTP response
//! - [`Error`], [`RequestError`], [`BulkError`] and [`Result`] - error handling
//! - [`HttpClient`] - the transport trait the connection pool implements
//! - [`ViewParams`] and [`encode`] - view/query parameters and their query string
//! - [`ViewTask`] - one view to warm, derived from a design document

mod body;
mod client;
mod design;
mod error;
mod method;
pub mod prelude;
mod query;
mod request;
mod response;

pub use body::{APPLICATION_JSON, from_json, from_json_with_status, to_json};
pub use client::HttpClient;
pub use design::{DESIGN_DOC_PREFIX, DESIGN_DOC_RANGE_END, ViewTask, design_name, view_names};
pub use error::{BulkError, Describe, Error, RequestError, Result, WarmupFailure};
pub use method::Method;
pub use query::{ViewParams, encode};
pub use request::{Request, RequestBuilder};
pub use response::Response;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
