//! CouchDB client that builds view indexes ahead of traffic.
//!
//! A [`Database`] handle wraps one database URL, a pooled HTTP client and a
//! Basic credential. On top of it:
//!
//! - [`Database::request`] sends one JSON request and classifies the answer
//! - [`Database::all_docs`] and [`Database::design_docs`] list documents
//! - [`Database::view`] and [`Database::view_docs`] query views, with the
//!   `keys` (`POST` body) and `rootKey` (prefix range) conventions
//! - [`Warmup`] and [`warm_up`] query every design document once so CouchDB
//!   builds the indexes before real traffic needs them
//!
//! # Example
//!
//! ```ignore
//! use couchwarm::{Database, Warmup};
//!
//! let db = Database::with_credentials("http://localhost:5984/orders", Some("admin"), Some("secret"))?;
//! let report = Warmup::new(db).run().await?;
//! println!("{} of {} views warmed", report.succeeded(), report.dispatched());
//! ```

mod auth;
mod client;
mod config;
mod connector;
mod database;
mod documents;
pub mod middleware;
pub mod prelude;
mod views;
mod warmup;

#[cfg(test)]
mod testing;

pub use auth::{AuthCredential, NO_CREDENTIAL};
pub use client::{HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder, UNBOUNDED_CONNECTION_LIMIT};
pub use database::Database;
pub use views::{KEYS_PARAM, ROOT_KEY_PARAM, ViewQuery, ViewRow};
pub use warmup::{
    FailurePolicy, Warmup, WarmupCallback, WarmupReport, WarmupScope, WarmupTarget,
    default_params, warm_up,
};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use couchwarm_core::{
    APPLICATION_JSON, BulkError, DESIGN_DOC_PREFIX, DESIGN_DOC_RANGE_END, Describe, Error,
    HttpClient, Method, Request, RequestBuilder, RequestError, Response, Result, ViewParams,
    ViewTask, WarmupFailure, design_name, encode, from_json, to_json, view_names,
};

// Re-export http types for status codes and headers
pub use couchwarm_core::{StatusCode, header};
