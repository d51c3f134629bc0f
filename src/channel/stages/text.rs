//! String manipulation stages

use serde::Deserialize;
use serde_json::Value;

use super::{mismatch, params, require, require_str, FieldParams};
use crate::channel::{Stage, StageError};
use crate::types::Document;

pub(super) const APPEND_TAG: &str = "append";
pub(super) const LOWERCASE_TAG: &str = "lowercase";
pub(super) const UPPERCASE_TAG: &str = "uppercase";
pub(super) const SPLIT_TAG: &str = "split";
pub(super) const TRIM_TAG: &str = "trim";
pub(super) const TRIM_SPACE_TAG: &str = "trim_space";

/// Append a suffix to a string field
#[derive(Debug, Clone)]
pub struct Append {
    field: String,
    suffix: String,
}

#[derive(Debug, Deserialize)]
struct AppendParams {
    field: String,
    append: String,
}

pub(super) fn build_append(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    let AppendParams { field, append } = params(APPEND_TAG, definition)?;
    Ok(Box::new(Append { field, suffix: append }))
}

impl Stage for Append {
    fn name(&self) -> &'static str {
        APPEND_TAG
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let appended = format!("{}{}", require_str(APPEND_TAG, doc, &self.field)?, self.suffix);
        doc.insert(self.field.clone(), Value::String(appended));
        Ok(())
    }
}

/// Letter case applied by a [`Case`] stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    /// `lowercase`
    Lower,
    /// `uppercase`
    Upper,
}

impl CaseMode {
    fn tag(self) -> &'static str {
        match self {
            CaseMode::Lower => LOWERCASE_TAG,
            CaseMode::Upper => UPPERCASE_TAG,
        }
    }

    fn convert(self, s: &str) -> String {
        match self {
            CaseMode::Lower => s.to_lowercase(),
            CaseMode::Upper => s.to_uppercase(),
        }
    }
}

/// Change the case of a string, or of every string inside an array
#[derive(Debug, Clone)]
pub struct Case {
    field: String,
    mode: CaseMode,
}

fn build_case(mode: CaseMode, definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    let FieldParams { field } = params(mode.tag(), definition)?;
    Ok(Box::new(Case { field, mode }))
}

pub(super) fn build_lowercase(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    build_case(CaseMode::Lower, definition)
}

pub(super) fn build_uppercase(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    build_case(CaseMode::Upper, definition)
}

impl Stage for Case {
    fn name(&self) -> &'static str {
        self.mode.tag()
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let tag = self.mode.tag();
        let converted = match require(tag, doc, &self.field)? {
            Value::String(s) => Value::String(self.mode.convert(s)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Value::String(self.mode.convert(s)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => return Err(mismatch(tag, &self.field, "a string or an array", other)),
        };
        doc.insert(self.field.clone(), converted);
        Ok(())
    }
}

/// Split a string field into an array of parts
#[derive(Debug, Clone)]
pub struct Split {
    field: String,
    separator: String,
}

#[derive(Debug, Deserialize)]
struct SplitParams {
    field: String,
    separator: String,
}

pub(super) fn build_split(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    let SplitParams { field, separator } = params(SPLIT_TAG, definition)?;
    if separator.is_empty() {
        return Err(StageError::invalid(SPLIT_TAG, "separator cannot be empty"));
    }
    Ok(Box::new(Split { field, separator }))
}

impl Stage for Split {
    fn name(&self) -> &'static str {
        SPLIT_TAG
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let parts: Vec<Value> = require_str(SPLIT_TAG, doc, &self.field)?
            .split(self.separator.as_str())
            .map(|part| Value::String(part.to_string()))
            .collect();
        doc.insert(self.field.clone(), Value::Array(parts));
        Ok(())
    }
}

/// Which side of a string a [`Trim`] stage drops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimFrom {
    /// Drop the first `total` characters
    Right,
    /// Keep only the first `total` characters
    Left,
}

/// Cut a string field at a character offset
///
/// `from = "right"` keeps what follows the first `total` characters; any
/// other value keeps the first `total` characters. Offsets past the end are
/// clamped.
#[derive(Debug, Clone)]
pub struct Trim {
    field: String,
    from: TrimFrom,
    total: usize,
}

#[derive(Debug, Deserialize)]
struct TrimParams {
    field: String,
    #[serde(default)]
    from: String,
    total: usize,
}

pub(super) fn build_trim(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    let TrimParams { field, from, total } = params(TRIM_TAG, definition)?;
    let from = if from == "right" { TrimFrom::Right } else { TrimFrom::Left };
    Ok(Box::new(Trim { field, from, total }))
}

impl Stage for Trim {
    fn name(&self) -> &'static str {
        TRIM_TAG
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let s = require_str(TRIM_TAG, doc, &self.field)?;
        let trimmed: String = match self.from {
            TrimFrom::Right => s.chars().skip(self.total).collect(),
            TrimFrom::Left => s.chars().take(self.total).collect(),
        };
        doc.insert(self.field.clone(), Value::String(trimmed));
        Ok(())
    }
}

/// Strip leading and trailing whitespace
#[derive(Debug, Clone)]
pub struct TrimSpace {
    field: String,
}

pub(super) fn build_trim_space(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    let FieldParams { field } = params(TRIM_SPACE_TAG, definition)?;
    Ok(Box::new(TrimSpace { field }))
}

impl Stage for TrimSpace {
    fn name(&self) -> &'static str {
        TRIM_SPACE_TAG
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let trimmed = require_str(TRIM_SPACE_TAG, doc, &self.field)?.trim().to_string();
        doc.insert(self.field.clone(), Value::String(trimmed));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::run_stage;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append() {
        let out = run_stage(json!({"type": "append", "field": "a", "append": "!"}), json!({"a": "hi"})).unwrap();
        assert_eq!(out["a"], "hi!");

        let err = run_stage(json!({"type": "append", "field": "a", "append": "!"}), json!({"a": 3})).unwrap_err();
        assert!(matches!(err, StageError::TypeMismatch { stage: "append", found: "number", .. }));
    }

    #[test]
    fn test_case_on_strings_and_arrays() {
        let out = run_stage(json!({"type": "uppercase", "field": "a"}), json!({"a": "MiXed"})).unwrap();
        assert_eq!(out["a"], "MIXED");

        let out = run_stage(json!({"type": "lowercase", "field": "a"}), json!({"a": ["AB", 1, "Cd"]})).unwrap();
        assert_eq!(out["a"], json!(["ab", 1, "cd"]));

        let err = run_stage(json!({"type": "lowercase", "field": "a"}), json!({"a": {}})).unwrap_err();
        assert!(matches!(err, StageError::TypeMismatch { stage: "lowercase", .. }));
    }

    #[test]
    fn test_split() {
        let out = run_stage(json!({"type": "split", "field": "a", "separator": ","}), json!({"a": "x,y,,z"})).unwrap();
        assert_eq!(out["a"], json!(["x", "y", "", "z"]));

        let err = run_stage(json!({"type": "split", "field": "a", "separator": ""}), json!({"a": "x"})).unwrap_err();
        assert!(matches!(err, StageError::InvalidStage { .. }));
    }

    #[test]
    fn test_trim_sides_and_clamping() {
        let left = json!({"type": "trim", "field": "a", "from": "left", "total": 3});
        assert_eq!(run_stage(left, json!({"a": "héllo"})).unwrap()["a"], "hél");

        let right = json!({"type": "trim", "field": "a", "from": "right", "total": 3});
        assert_eq!(run_stage(right, json!({"a": "héllo"})).unwrap()["a"], "lo");

        let past_end = json!({"type": "trim", "field": "a", "from": "right", "total": 99});
        assert_eq!(run_stage(past_end, json!({"a": "abc"})).unwrap()["a"], "");
    }

    #[test]
    fn test_trim_space() {
        let out = run_stage(json!({"type": "trim_space", "field": "a"}), json!({"a": "  pad\t"})).unwrap();
        assert_eq!(out["a"], "pad");

        let err = run_stage(json!({"type": "trim_space", "field": "b"}), json!({"a": ""})).unwrap_err();
        assert!(matches!(err, StageError::FieldMissing { .. }));
    }
}
