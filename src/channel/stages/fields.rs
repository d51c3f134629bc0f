//! Stages that add, drop or move fields

use serde::Deserialize;
use serde_json::Value;

use super::{params, FieldParams};
use crate::channel::{Stage, StageError};
use crate::types::Document;

pub(super) const SET_TAG: &str = "set";
pub(super) const REMOVE_TAG: &str = "remove";
pub(super) const RENAME_TAG: &str = "rename";

/// Write a fixed JSON value into a field
#[derive(Debug, Clone)]
pub struct Set {
    field: String,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct SetParams {
    field: String,
    value: Value,
}

pub(super) fn build_set(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    let SetParams { field, value } = params(SET_TAG, definition)?;
    Ok(Box::new(Set { field, value }))
}

impl Stage for Set {
    fn name(&self) -> &'static str {
        SET_TAG
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        doc.insert(self.field.clone(), self.value.clone());
        Ok(())
    }
}

/// Delete a field
#[derive(Debug, Clone)]
pub struct Remove {
    field: String,
}

pub(super) fn build_remove(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    let FieldParams { field } = params(REMOVE_TAG, definition)?;
    Ok(Box::new(Remove { field }))
}

impl Stage for Remove {
    fn name(&self) -> &'static str {
        REMOVE_TAG
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        doc.shift_remove(&self.field)
            .map(|_| ())
            .ok_or_else(|| StageError::FieldMissing {
                stage: REMOVE_TAG,
                field: self.field.clone(),
            })
    }
}

/// Move a field's value under a new name
#[derive(Debug, Clone)]
pub struct Rename {
    field: String,
    new_name: String,
}

#[derive(Debug, Deserialize)]
struct RenameParams {
    field: String,
    new_name: String,
}

pub(super) fn build_rename(definition: &Value) -> Result<Box<dyn Stage>, StageError> {
    let RenameParams { field, new_name } = params(RENAME_TAG, definition)?;
    Ok(Box::new(Rename { field, new_name }))
}

impl Stage for Rename {
    fn name(&self) -> &'static str {
        RENAME_TAG
    }

    fn apply(&self, doc: &mut Document) -> Result<(), StageError> {
        let value = doc.shift_remove(&self.field).ok_or_else(|| StageError::FieldMissing {
            stage: RENAME_TAG,
            field: self.field.clone(),
        })?;
        doc.insert(self.new_name.clone(), value);
        Ok(())
    }
}
