//! Body serialization utilities.

use bytes::Bytes;

use crate::Result;

/// MIME type sent as both `content-type` and `accept` on every database request.
pub const APPLICATION_JSON: &str = "application/json";

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use couchwarm_core::to_json;
///
/// let bytes = to_json(&serde_json::json!({ "keys": ["a"] })).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"keys":["a"]}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` so a failure names the field that could not be
/// decoded (e.g. `rows[3].key`).
///
/// # Errors
///
/// Returns [`crate::Error::ResponseDecode`] without a status code.
///
/// # Example
///
/// ```
/// use couchwarm_core::from_json;
///
/// let value: serde_json::Value = from_json(br#"{"ok":true}"#).expect("deserialize");
/// assert_eq!(value["ok"], true);
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    decode(None, bytes)
}

/// Like [`from_json`], but records the status of the response the bytes came from.
///
/// # Errors
///
/// Returns [`crate::Error::ResponseDecode`] carrying `status`.
pub fn from_json_with_status<T: serde::de::DeserializeOwned>(
    status: u16,
    bytes: &[u8],
) -> Result<T> {
    decode(Some(status), bytes)
}

fn decode<T: serde::de::DeserializeOwned>(status: Option<u16>, bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::response_decode(status, e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_json_serialize() {
        #[derive(serde::Serialize)]
        struct Keys {
            keys: Vec<&'static str>,
        }

        let bytes = to_json(&Keys {
            keys: vec!["a", "b"],
        })
        .expect("serialize");
        assert_eq!(bytes.as_ref(), br#"{"keys":["a","b"]}"#);
    }

    #[test]
    fn from_json_syntax_error() {
        let result: Result<serde_json::Value> = from_json(b"not json");

        let err = result.expect_err("should fail");
        assert!(err.to_string().contains("could not decode response"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn from_json_with_status_keeps_status() {
        let result: Result<serde_json::Value> = from_json_with_status(200, b"<html>");

        let err = result.expect_err("should fail");
        assert!(matches!(
            err,
            crate::Error::ResponseDecode {
                status: Some(200),
                ..
            }
        ));
    }

    #[test]
    fn from_json_missing_field_error_with_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Row {
            #[allow(dead_code)]
            key: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct Page {
            #[allow(dead_code)]
            rows: Vec<Row>,
        }

        let result: Result<Page> = from_json(br#"{"rows":[{"key":"a"},{"value":1}]}"#);

        let msg = result.expect_err("should fail").to_string();
        assert!(msg.contains("rows[1]"), "Expected path 'rows[1]' in error: {msg}");
        assert!(msg.contains("key"), "Expected field 'key' mentioned in error: {msg}");
    }
}
