//! Document listing: `_all_docs` and design documents.

use couchwarm_core::{DESIGN_DOC_PREFIX, DESIGN_DOC_RANGE_END, HttpClient, ViewParams, encode};
use serde::Deserialize;
use serde_json::Value;

use crate::{Database, Method, Result};

/// Row of an `_all_docs` answer; only the embedded document is kept.
#[derive(Debug, Deserialize)]
struct DocRow {
    #[serde(default)]
    doc: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DocRows {
    rows: Vec<DocRow>,
}

impl<C: HttpClient> Database<C> {
    /// Fetch documents through `_all_docs`.
    ///
    /// `include_docs` is always sent as `true`, whatever `params` says. Rows
    /// without a document come back as `None`, in row order.
    pub async fn all_docs(&self, params: Option<ViewParams>) -> Result<Vec<Option<Value>>> {
        let mut params = params.unwrap_or_default();
        params.insert("include_docs", true);

        let path = format!("_all_docs{}", encode(Some(&params)));
        let page: DocRows = self.request_as(Method::Get, Some(&path), None).await?;

        Ok(page.rows.into_iter().map(|row| row.doc).collect())
    }

    /// Fetch every design document.
    ///
    /// Asks `_all_docs` for the id range `"_design/"` to `"_design0"`.
    pub async fn design_docs(&self) -> Result<Vec<Option<Value>>> {
        let params = ViewParams::new()
            .with("startkey", DESIGN_DOC_PREFIX)
            .with("endkey", DESIGN_DOC_RANGE_END);
        self.all_docs(Some(params)).await
    }
}
