//! HTTP response handling.
//!
//! [`Response`] holds the status, headers and the fully buffered body. The
//! database handle reads the whole body before classifying the response.

use std::collections::HashMap;

use bytes::Bytes;

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: HashMap<String, String>,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 400 or above: the database refused or failed the call.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.status >= 400
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }
}

impl Response<Bytes> {
    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ResponseDecode`] if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json_with_status(self.status, &self.body)
    }

    /// Body as UTF-8 text, lossily decoded and trimmed.
    #[must_use]
    pub fn trimmed_text(&self) -> String {
        String::from_utf8_lossy(&self.body).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_basic() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        let response = Response::new(200, headers, Bytes::from(r#"{"ok":true}"#));

        assert_eq!(response.status(), 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert!(response.is_success());
        assert!(!response.is_failure());
    }

    #[test]
    fn failure_starts_at_400() {
        assert!(!Response::new(399, HashMap::new(), Bytes::new()).is_failure());
        assert!(Response::new(400, HashMap::new(), Bytes::new()).is_failure());
        assert!(Response::new(404, HashMap::new(), Bytes::new()).is_failure());

        let response = Response::new(503, HashMap::new(), Bytes::new());
        assert!(response.is_failure());
        assert!(response.is_server_error());
    }

    #[test]
    fn response_json() {
        let body = Bytes::from(r#"{"total_rows":0,"rows":[]}"#);
        let response = Response::new(200, HashMap::new(), body);

        let value: serde_json::Value = response.json().expect("deserialize");
        assert_eq!(value["total_rows"], 0);
    }

    #[test]
    fn trimmed_text_strips_newlines() {
        let response = Response::new(
            404,
            HashMap::new(),
            Bytes::from("{\"error\":\"not_found\"}\n"),
        );
        assert_eq!(response.trimmed_text(), r#"{"error":"not_found"}"#);
    }
}
