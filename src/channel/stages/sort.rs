//! Array sorting stage

use serde::Deserialize;
use serde_json::Value;

use super::{mismatch, params, require};
use crate::channel::{Stage, StageError};
use crate::types::Document;

pub(super) const TAG: &str = "sort";

/// Sort an array field holding only strings or only numbers
#[derive(Debug, Clone)]
pub struct Sort {
    field: String,
    descending: bool,
}

#[derive(Debug, Deserialize)]
struct SortParams {
    field: String,
    #[serde(default)]
    descending: bool,
}

pub(super) fn build(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    let SortParams { field, descending } = params(TAG, definition)?;
    Ok(Box::new(Sort { field, descending }))
}

fn number_key(value: &Value) -> f64 {
    value.as_f64().unwrap_or_default()
}

impl Stage for Sort {
    fn name(&self) -> &'static str {
        TAG
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let value = require(TAG, doc, &self.field)?;
        let mut items = value
            .as_array()
            .ok_or_else(|| mismatch(TAG, &self.field, "an array", value))?
            .clone();

        if items.iter().all(Value::is_string) {
            items.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
        } else if items.iter().all(Value::is_number) {
            items.sort_by(|a, b| number_key(a).total_cmp(&number_key(b)));
        } else {
            return Err(mismatch(TAG, &self.field, "an array of only strings or only numbers", value));
        }

        if self.descending {
            items.reverse();
        }

        doc.insert(self.field.clone(), Value::Array(items));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::run_stage;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_strings_and_numbers() {
        let out = run_stage(json!({"type": "sort", "field": "a"}), json!({"a": ["b", "c", "a"]})).unwrap();
        assert_eq!(out["a"], json!(["a", "b", "c"]));

        let out = run_stage(
            json!({"type": "sort", "field": "a", "descending": true}),
            json!({"a": [2, 10.5, -1]}),
        )
        .unwrap();
        assert_eq!(out["a"], json!([10.5, 2, -1]));
    }

    #[test]
    fn test_sort_rejects_mixed_and_non_arrays() {
        let err = run_stage(json!({"type": "sort", "field": "a"}), json!({"a": [1, "x"]})).unwrap_err();
        assert!(matches!(err, StageError::TypeMismatch { stage: "sort", .. }));

        let err = run_stage(json!({"type": "sort", "field": "a"}), json!({"a": "x"})).unwrap_err();
        assert!(matches!(err, StageError::TypeMismatch { found: "string", .. }));
    }

    #[test]
    fn test_sort_empty_array() {
        let out = run_stage(json!({"type": "sort", "field": "a"}), json!({"a": []})).unwrap();
        assert_eq!(out["a"], json!([]));
    }
}
