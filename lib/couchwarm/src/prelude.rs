//! Prelude module for convenient imports.
//!
//! ```ignore
//! use couchwarm::prelude::*;
//! ```

pub use crate::{
    AuthCredential, ClientConfig, Database, Describe, Error, FailurePolicy, HttpClient,
    HyperClient, Method, Result, ViewParams, ViewQuery, ViewRow, ViewTask, Warmup, WarmupReport,
    WarmupScope, warm_up,
};
pub use serde::{Deserialize, Serialize};
pub use serde_json::{Value, json};
