//! View and document query parameters.
//!
//! CouchDB expects every query parameter value to be JSON: `startkey="a"`,
//! `limit=1`, `keys=["a","b"]`. [`ViewParams`] keeps the parameters in the
//! order they were inserted and [`encode`] turns them into the query string,
//! JSON-encoding then percent-encoding each value.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Map, Value};

/// Characters left untouched when percent-encoding a value.
///
/// Everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped, so `"`, `[`,
/// `{` and `,` inside JSON values always travel escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Insertion-ordered query parameters for document and view requests.
///
/// Overwriting a key keeps its original position; new keys are appended.
///
/// # Example
///
/// ```
/// use couchwarm_core::{ViewParams, encode};
///
/// let params = ViewParams::new().with("limit", 1).with("reduce", false);
/// assert_eq!(encode(Some(&params)), "?limit=1&reduce=false");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewParams(Map<String, Value>);

impl ViewParams {
    /// Empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`ViewParams::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes `key` without disturbing the order of the other keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether `key` is set.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for ViewParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ViewParams {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a ViewParams {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Encode `params` as a query string.
///
/// Returns `""` for absent or empty parameters, otherwise `?k1=v1&k2=v2`
/// with keys in insertion order and each value JSON-encoded then
/// percent-encoded. Keys are neither sorted nor deduplicated.
///
/// # Example
///
/// ```
/// use couchwarm_core::{ViewParams, encode};
///
/// let params = ViewParams::new().with("foo", "bar");
/// assert_eq!(encode(Some(&params)), "?foo=%22bar%22");
/// assert_eq!(encode(None), "");
/// ```
#[must_use]
pub fn encode(params: Option<&ViewParams>) -> String {
    let Some(params) = params else {
        return String::new();
    };

    params
        .iter()
        .enumerate()
        .fold(String::new(), |mut query, (index, (key, value))| {
            query.push(if index == 0 { '?' } else { '&' });
            query.push_str(key);
            query.push('=');
            query.extend(utf8_percent_encode(&value.to_string(), COMPONENT));
            query
        })
}
