//! Join several fields, or the items of an array field, into one string

use serde::Deserialize;
use serde_json::Value;

use super::{mismatch, params, require};
use crate::channel::{Stage, StageError};
use crate::types::document::stringify;
use crate::types::Document;

pub(super) const TAG: &str = "join";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JoinField {
    Array(String),
    Fields(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct JoinParams {
    field: JoinField,
    separator: String,
    new_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    /// Named fields, concatenated in order
    Fields(Vec<String>),
    /// One array field whose elements are concatenated
    Array(String),
}

/// Concatenate stringified values with a separator
///
/// `field` is either a list of field names or the name of one array field.
/// A list requires `new_field`; an array field is joined in place unless
/// `new_field` is given.
#[derive(Debug, Clone)]
pub struct Join {
    source: Source,
    separator: String,
    destination: String,
}

pub(super) fn build(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    let JoinParams {
        field,
        separator,
        new_field,
    } = params(TAG, definition)?;

    let (source, destination) = match field {
        JoinField::Fields(names) => {
            if names.is_empty() {
                return Err(StageError::invalid(TAG, "field list is empty"));
            }
            let destination =
                new_field.ok_or_else(|| StageError::invalid(TAG, "new_field is required when field is a list"))?;
            (Source::Fields(names), destination)
        }
        JoinField::Array(name) => {
            let destination = new_field.unwrap_or_else(|| name.clone());
            (Source::Array(name), destination)
        }
    };

    Ok(Box::new(Join {
        source,
        separator,
        destination,
    }))
}

impl Stage for Join {
    fn name(&self) -> &'static str {
        TAG
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let parts = match &self.source {
            Source::Fields(names) => names
                .iter()
                .map(|name| require(TAG, doc, name).map(stringify))
                .collect::<Result<Vec<_>, _>>()?,
            Source::Array(name) => {
                let value = require(TAG, doc, name)?;
                value
                    .as_array()
                    .ok_or_else(|| mismatch(TAG, name, "an array", value))?
                    .iter()
                    .map(stringify)
                    .collect()
            }
        };

        doc.insert(self.destination.clone(), Value::String(parts.join(&self.separator)));
        Ok(())
    }
}
