//! HTTP method types.

use derive_more::Display;

/// HTTP request method.
///
/// CouchDB reads use `GET`, except view queries carrying an explicit key
/// list, which are sent as `POST` with the keys in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET method - read documents or query a view.
    #[display("GET")]
    Get,
    /// POST method - view query with a `keys` body, or document creation.
    #[display("POST")]
    Post,
    /// PUT method - create or replace a document.
    #[display("PUT")]
    Put,
    /// DELETE method - remove a document.
    #[display("DELETE")]
    Delete,
}

impl Method {
    /// Returns `true` if repeating the request has the same effect as sending it once.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}
