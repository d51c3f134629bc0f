//! Document representation and field helpers
//!
//! A document is a JSON object. Its id lives outside the object, as the key
//! of the storage entry, and is only merged in as the `id` field when the
//! document is handed back to a reader.

use serde_json::{Map, Value};

use crate::constants::ID_FIELD;
use crate::core::{Error, Result};

/// Field name to JSON value mapping
pub type Document = Map<String, Value>;

/// Convert a request body into a document
///
/// Only JSON objects are documents; any other value is rejected.
pub fn document_from_value(value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::invalid_input(format!(
            "document must be a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

/// Render a document for a reader, with `id` as its first field
///
/// The entry key always wins over an `id` field stored inside the document.
pub fn with_id(id: &str, doc: &Document) -> Value {
    let mut out = Map::with_capacity(doc.len() + 1);
    out.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    for (key, value) in doc {
        if key != ID_FIELD {
            out.insert(key.clone(), value.clone());
        }
    }
    Value::Object(out)
}

/// Follow a dot-separated path (`user.address.city`) through nested objects
///
/// `null` values count as absent.
pub fn lookup_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// String form of a JSON value
///
/// Strings are taken verbatim, everything else uses its JSON text.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Human readable JSON type name, used in error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        document_from_value(value).unwrap()
    }

    #[test]
    fn test_only_objects_are_documents() {
        assert!(document_from_value(json!({"a": 1})).is_ok());
        assert!(document_from_value(json!([1, 2])).is_err());
        assert!(document_from_value(json!("text")).is_err());
    }

    #[test]
    fn test_with_id_puts_key_first_and_overrides() {
        let rendered = with_id("k1", &doc(json!({"name": "mario", "id": "stale"})));
        assert_eq!(rendered.to_string(), r#"{"id":"k1","name":"mario"}"#);
    }

    #[test]
    fn test_lookup_nested_path() {
        let d = doc(json!({"user": {"id": 7, "tag": null}, "top": "x"}));
        assert_eq!(lookup_path(&d, "top"), Some(&json!("x")));
        assert_eq!(lookup_path(&d, "user.id"), Some(&json!(7)));
        assert_eq!(lookup_path(&d, "user.tag"), None);
        assert_eq!(lookup_path(&d, "user.missing"), None);
        assert_eq!(lookup_path(&d, "top.deeper"), None);
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!("world")), "world");
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!([1, "a"])), r#"[1,"a"]"#);
    }
}
