//! HTTP request building.
//!
//! A [`Request`] is built fresh for every call against the database and is
//! kept inside [`crate::RequestError`] when the call fails, so the failing
//! method, URL and headers can be inspected afterwards.
//!
//! # Example
//!
//! ```
//! use couchwarm_core::{Request, Method};
//! use bytes::Bytes;
//!
//! let request = Request::<Bytes>::builder(Method::Get, "http://localhost:5984/db/_all_docs".parse().unwrap())
//!     .header("accept", "application/json")
//!     .build();
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use crate::Method;

/// An HTTP request with method, absolute URL, headers, and optional body.
#[derive(Debug, Clone)]
pub struct Request<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
}

impl<B> Request<B> {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder<B> {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Absolute request URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, HashMap<String, String>, Option<B>) {
        (self.method, self.url, self.headers, self.body)
    }
}

impl Request<Bytes> {
    /// Body as UTF-8 text, lossily decoded. Empty when there is no body.
    #[must_use]
    pub fn body_text(&self) -> String {
        self.body
            .as_ref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
            .unwrap_or_default()
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder<B = Bytes> {
    method: Method,
    url: url::Url,
    headers: HashMap<String, String>,
    body: Option<B>,
}

impl<B> RequestBuilder<B> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl RequestBuilder<Bytes> {
    /// Serialize `value` as the JSON body.
    ///
    /// The content type is not touched here: database requests always carry
    /// the JSON headers, with or without a body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize + ?Sized>(self, value: &T) -> crate::Result<Self> {
        let body = crate::to_json(value)?;
        Ok(self.body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> url::Url {
        url::Url::parse(raw).expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::<Bytes>::builder(Method::Get, url("http://localhost:5984/db"))
            .header("accept", "application/json")
            .build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "http://localhost:5984/db");
        assert_eq!(request.header("accept"), Some("application/json"));
        assert!(request.body().is_none());
        assert_eq!(request.body_text(), "");
    }

    #[test]
    fn request_builder_json() {
        let request = Request::builder(Method::Post, url("http://localhost:5984/db/_design/d/_view/v"))
            .json(&serde_json::json!({ "keys": ["a", "b"] }))
            .expect("json")
            .build();

        assert_eq!(request.body_text(), r#"{"keys":["a","b"]}"#);
        assert!(request.header("content-type").is_none());
    }

    #[test]
    fn request_into_parts() {
        let request = Request::builder(Method::Put, url("http://localhost:5984/db/doc"))
            .header("accept", "application/json")
            .body(Bytes::from_static(b"{}"))
            .build();

        let (method, url, headers, body) = request.into_parts();

        assert_eq!(method, Method::Put);
        assert_eq!(url.path(), "/db/doc");
        assert_eq!(headers.get("accept").map(String::as_str), Some("application/json"));
        assert_eq!(body, Some(Bytes::from_static(b"{}")));
    }
}
