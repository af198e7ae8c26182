//! In-memory [`HttpClient`] for unit tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use couchwarm_core::HttpClient;
use serde_json::Value;

use crate::{Request, Response, Result};

type Responder = dyn Fn(&Request<Bytes>) -> Response<Bytes> + Send + Sync;

/// Answers every request through a closure and records it.
#[derive(Clone)]
pub(crate) struct MockClient {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<Request<Bytes>>>>,
}

impl MockClient {
    pub(crate) fn new(
        responder: impl Fn(&Request<Bytes>) -> Response<Bytes> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Arc::new(responder),
            requests: Arc::default(),
        }
    }

    /// Requests received so far, in arrival order.
    pub(crate) fn requests(&self) -> Vec<Request<Bytes>> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new(|_| json_response(200, &Value::Object(serde_json::Map::new())))
    }
}

impl fmt::Debug for MockClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockClient").finish_non_exhaustive()
    }
}

impl HttpClient for MockClient {
    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let response = (self.responder)(&request);
        self.requests.lock().expect("requests lock").push(request);
        Ok(response)
    }
}

pub(crate) fn json_response(status: u16, body: &Value) -> Response<Bytes> {
    let headers = HashMap::from([("content-type".to_string(), "application/json".to_string())]);
    Response::new(status, headers, Bytes::from(body.to_string()))
}

pub(crate) fn text_response(status: u16, body: &str) -> Response<Bytes> {
    let headers = HashMap::from([("content-type".to_string(), "text/plain".to_string())]);
    Response::new(status, headers, Bytes::from(body.to_string()))
}
