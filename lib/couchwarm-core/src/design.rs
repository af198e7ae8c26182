//! Design documents and the views they declare.

use std::fmt;

use serde_json::Value;

/// Id prefix of every design document.
pub const DESIGN_DOC_PREFIX: &str = "_design/";

/// Upper bound of the design document id range.
///
/// `'0'` is the character right after `'/'`, so under CouchDB collation
/// `"_design0"` sorts after every `"_design/<name>"` id.
pub const DESIGN_DOC_RANGE_END: &str = "_design0";

/// One view to warm: the design document name and a view it declares.
///
/// Either part may be missing when the design document is malformed or
/// declares no views; such tasks are skipped when dispatching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewTask {
    design: Option<String>,
    view: Option<String>,
}

impl ViewTask {
    /// A complete task.
    #[must_use]
    pub fn new(design: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            design: Some(design.into()),
            view: Some(view.into()),
        }
    }

    /// Task for the first view declared by `doc`.
    ///
    /// Only the first view is looked at, whatever else the document declares.
    #[must_use]
    pub fn first_view(doc: &Value) -> Self {
        Self {
            design: design_name(doc).map(str::to_string),
            view: view_names(doc).next().map(str::to_string),
        }
    }

    /// One task per view declared by `doc`, in document order.
    #[must_use]
    pub fn all_views(doc: &Value) -> Vec<Self> {
        let design = design_name(doc).map(str::to_string);
        view_names(doc)
            .map(|view| Self {
                design: design.clone(),
                view: Some(view.to_string()),
            })
            .collect()
    }

    /// Design document name, without the `_design/` prefix.
    #[must_use]
    pub fn design(&self) -> Option<&str> {
        self.design.as_deref()
    }

    /// View name.
    #[must_use]
    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    /// Both parts, when the task can be dispatched.
    ///
    /// An empty name counts as missing.
    #[must_use]
    pub fn parts(&self) -> Option<(&str, &str)> {
        let design = self.design().filter(|name| !name.is_empty())?;
        let view = self.view().filter(|name| !name.is_empty())?;
        Some((design, view))
    }
}

impl fmt::Display for ViewTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.design().unwrap_or("?"),
            self.view().unwrap_or("?")
        )
    }
}

/// Design name taken from the document `_id` (`"_design/<name>"`).
#[must_use]
pub fn design_name(doc: &Value) -> Option<&str> {
    doc.get("_id")?
        .as_str()?
        .strip_prefix(DESIGN_DOC_PREFIX)
}

/// Names of the views declared in the document's `views` object, in document order.
pub fn view_names(doc: &Value) -> impl Iterator<Item = &str> {
    doc.get("views")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|views| views.keys().map(String::as_str))
}
