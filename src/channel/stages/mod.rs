//! Builtin stage kinds
//!
//! Every stage is configured by the JSON object that names it, e.g.
//! `{"type": "rename", "field": "a", "new_name": "b"}`. Parameters are
//! deserialized with serde when the channel is compiled, so a malformed
//! definition is rejected before any document is touched.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::channel::{StageError, StageRegistry};
use crate::types::document::json_type_name;
use crate::types::Document;

mod fields;
mod join;
mod sort;
mod text;

pub use fields::{Remove, Rename, Set};
pub use join::Join;
pub use sort::Sort;
pub use text::{Append, Case, CaseMode, Split, Trim, TrimFrom, TrimSpace};

/// Register every builtin stage kind
pub fn register_builtin(registry: &mut StageRegistry) {
    registry.register(join::TAG, join::build);
    registry.register(fields::SET_TAG, fields::build_set);
    registry.register(fields::REMOVE_TAG, fields::build_remove);
    registry.register(fields::RENAME_TAG, fields::build_rename);
    registry.register(text::APPEND_TAG, text::build_append);
    registry.register(text::LOWERCASE_TAG, text::build_lowercase);
    registry.register(text::UPPERCASE_TAG, text::build_uppercase);
    registry.register(text::SPLIT_TAG, text::build_split);
    registry.register(text::TRIM_TAG, text::build_trim);
    registry.register(text::TRIM_SPACE_TAG, text::build_trim_space);
    registry.register(sort::TAG, sort::build);
}

/// Parameters of stages that only name a field
#[derive(Debug, Deserialize)]
struct FieldParams {
    field: String,
}

fn params<T: DeserializeOwned>(stage: &'static str, definition: &Value) -> Result<T, StageError> {
    T::deserialize(definition).map_err(|err| StageError::invalid(stage, err.to_string()))
}

fn require<'a>(stage: &'static str, doc: &'a Document, field: &str) -> Result<&'a Value, StageError> {
    doc.get(field).ok_or_else(|| StageError::FieldMissing {
        stage,
        field: field.to_string(),
    })
}

fn require_str<'a>(stage: &'static str, doc: &'a Document, field: &str) -> Result<&'a str, StageError> {
    let value = require(stage, doc, field)?;
    value
        .as_str()
        .ok_or_else(|| mismatch(stage, field, "a string", value))
}

fn mismatch(stage: &'static str, field: &str, expected: &'static str, found: &Value) -> StageError {
    StageError::TypeMismatch {
        stage,
        field: field.to_string(),
        expected,
        found: json_type_name(found),
    }
}

/// Compile a single stage definition and run it over `input`
#[cfg(test)]
fn run_stage(definition: Value, input: Value) -> Result<Value, StageError> {
    let channel = StageRegistry::with_builtin().compile(&[definition])?;
    let doc = crate::types::document::document_from_value(input).unwrap();
    channel.run(&doc).map(Value::Object)
}
