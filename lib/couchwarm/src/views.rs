//! MapReduce view queries.
//!
//! Two conventions shape a view query beyond plain parameters:
//!
//! - `keys`: an explicit key list. The query becomes a `POST` with
//!   `{"keys": [...]}` as body, and `keys` leaves the query string.
//! - `rootKey`: a key prefix. `rootKey = K` becomes `startkey = K` and
//!   `endkey = K + [{}]`. Objects sort after every other JSON type under
//!   CouchDB collation, so the range covers every key starting with `K`.

use couchwarm_core::{HttpClient, ViewParams, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{Database, Error, Method, Result};

/// Parameter holding an explicit key list.
pub const KEYS_PARAM: &str = "keys";

/// Parameter holding a key prefix.
pub const ROOT_KEY_PARAM: &str = "rootKey";

/// One row of a view answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    /// Id of the emitting document; absent on reduced rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Emitted key.
    #[serde(default)]
    pub key: Value,
    /// Emitted (or reduced) value.
    #[serde(default)]
    pub value: Value,
    /// Embedded document, with `include_docs=true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ViewRows {
    rows: Vec<ViewRow>,
}

/// Typed builder for view parameters.
///
/// Parameters keep the order the methods are called in.
///
/// # Example
///
/// ```
/// use couchwarm::ViewQuery;
/// use couchwarm_core::encode;
///
/// let params = ViewQuery::new().limit(1).reduce(false).into_params();
/// assert_eq!(encode(Some(&params)), "?limit=1&reduce=false");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery(ViewParams);

impl ViewQuery {
    /// No parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key, value);
        self
    }

    /// Maximum number of rows.
    #[must_use]
    pub fn limit(self, limit: u64) -> Self {
        self.set("limit", limit)
    }

    /// Rows to skip.
    #[must_use]
    pub fn skip(self, skip: u64) -> Self {
        self.set("skip", skip)
    }

    /// Whether to run the reduce function.
    #[must_use]
    pub fn reduce(self, reduce: bool) -> Self {
        self.set("reduce", reduce)
    }

    /// Whether to embed the emitting documents.
    #[must_use]
    pub fn include_docs(self, include_docs: bool) -> Self {
        self.set("include_docs", include_docs)
    }

    /// Reverse row order.
    #[must_use]
    pub fn descending(self, descending: bool) -> Self {
        self.set("descending", descending)
    }

    /// Group reduced rows by key.
    #[must_use]
    pub fn group(self, group: bool) -> Self {
        self.set("group", group)
    }

    /// Group reduced rows by the first `level` elements of array keys.
    #[must_use]
    pub fn group_level(self, level: u32) -> Self {
        self.set("group_level", level)
    }

    /// First key of the range.
    #[must_use]
    pub fn start_key(self, key: impl Into<Value>) -> Self {
        self.set("startkey", key)
    }

    /// Last key of the range.
    #[must_use]
    pub fn end_key(self, key: impl Into<Value>) -> Self {
        self.set("endkey", key)
    }

    /// Index update mode: `"true"`, `"false"` or `"lazy"`.
    #[must_use]
    pub fn update(self, mode: &str) -> Self {
        self.set("update", mode)
    }

    /// Explicit key list; sends the query as `POST`.
    #[must_use]
    pub fn keys<K: Into<Value>>(self, keys: impl IntoIterator<Item = K>) -> Self {
        let keys: Vec<Value> = keys.into_iter().map(Into::into).collect();
        self.set(KEYS_PARAM, keys)
    }

    /// Array key prefix; every key starting with these elements matches.
    #[must_use]
    pub fn root_key<K: Into<Value>>(self, prefix: impl IntoIterator<Item = K>) -> Self {
        let prefix: Vec<Value> = prefix.into_iter().map(Into::into).collect();
        self.set(ROOT_KEY_PARAM, prefix)
    }

    /// The raw parameters.
    #[must_use]
    pub fn into_params(self) -> ViewParams {
        self.0
    }
}

impl From<ViewQuery> for ViewParams {
    fn from(query: ViewQuery) -> Self {
        query.into_params()
    }
}

/// Present and not `null`.
fn take_param(params: &mut ViewParams, key: &str) -> Option<Value> {
    if params.get(key).is_some_and(|v| !v.is_null()) {
        params.remove(key)
    } else {
        None
    }
}

/// Rewrite the key-list and key-prefix conventions.
///
/// Returns the method and the body to send. `keys` wins over `rootKey`; a
/// `rootKey` next to `keys` is left as a plain parameter.
fn shape_query(params: &mut ViewParams) -> Result<(Method, Option<Value>)> {
    if let Some(keys) = take_param(params, KEYS_PARAM) {
        return Ok((Method::Post, Some(json!({ KEYS_PARAM: keys }))));
    }

    if let Some(root_key) = take_param(params, ROOT_KEY_PARAM) {
        let Value::Array(prefix) = root_key else {
            return Err(Error::invalid_request(format!(
                "{ROOT_KEY_PARAM} must be an array, got {root_key}"
            )));
        };
        let mut end_key = prefix.clone();
        end_key.push(json!({}));
        params.insert("startkey", prefix);
        params.insert("endkey", end_key);
    }

    Ok((Method::Get, None))
}

impl<C: HttpClient> Database<C> {
    /// Query `design/_view/view` and return its rows.
    ///
    /// `keys` in `params` turns the query into a `POST`; `rootKey` turns it
    /// into a prefix range (see the module docs).
    ///
    /// # Errors
    ///
    /// Besides request errors, a `rootKey` that is not an array is rejected
    /// with [`Error::InvalidRequest`] before anything is sent.
    pub async fn view(
        &self,
        design: &str,
        view: &str,
        params: Option<ViewParams>,
    ) -> Result<Vec<ViewRow>> {
        let mut params = params.unwrap_or_default();
        let (method, body) = shape_query(&mut params)?;

        let path = format!("_design/{design}/_view/{view}{}", encode(Some(&params)));
        let page: ViewRows = self.request_as(method, Some(&path), body.as_ref()).await?;
        Ok(page.rows)
    }

    /// Query a view for the emitting documents.
    ///
    /// Forces `reduce=false` and `include_docs=true`. Rows without a document
    /// come back as `None`.
    pub async fn view_docs(
        &self,
        design: &str,
        view: &str,
        params: Option<ViewParams>,
    ) -> Result<Vec<Option<Value>>> {
        let mut params = params.unwrap_or_default();
        params.insert("reduce", false);
        params.insert("include_docs", true);

        let rows = self.view(design, view, Some(params)).await?;
        Ok(rows.into_iter().map(|row| row.doc).collect())
    }
}
