//! Prelude module for convenient imports.
//!
//! ```ignore
//! use couchwarm_core::prelude::*;
//! ```

pub use crate::{
    Describe, Error, HttpClient, Method, Request, RequestBuilder, RequestError, Response, Result,
    ViewParams, ViewTask, encode, from_json, to_json,
};
