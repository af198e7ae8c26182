//! Basic authentication credential.
//!
//! Every request carries `Authorization: Basic <credential>`. When no
//! username/password pair is known the credential is the literal `none`,
//! which CouchDB treats as an anonymous request.

use std::fmt;
use std::sync::Arc;

use base64::Engine;

/// Value sent in place of a token when no credential is configured.
pub const NO_CREDENTIAL: &str = "none";

/// Credential computed once when a [`crate::Database`] is built.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthCredential {
    /// Base64-encoded `"username:password"`.
    Basic(Arc<str>),
    /// No credential; sent as `Basic none`.
    #[default]
    None,
}

impl AuthCredential {
    /// Encode `username:password`.
    pub fn basic(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        Self::Basic(Arc::from(encoded))
    }

    /// Encode the pair when both parts are given, otherwise [`AuthCredential::None`].
    #[must_use]
    pub fn from_user_pass(username: Option<&str>, password: Option<&str>) -> Self {
        match (username, password) {
            (Some(username), Some(password)) => Self::basic(username, password),
            _ => Self::None,
        }
    }

    /// The token part of the header.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::Basic(encoded) => encoded.as_ref(),
            Self::None => NO_CREDENTIAL,
        }
    }

    /// Full `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Basic {}", self.token())
    }
}

impl fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(_) => f.write_str("Basic(<redacted>)"),
            Self::None => f.write_str("None"),
        }
    }
}
