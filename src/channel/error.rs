//! Stage compile and runtime errors

use thiserror::Error;

use crate::core::ErrorKind;

/// Failure of a channel stage
///
/// `UnknownStageType` and `InvalidStage` are raised while a channel is
/// compiled and fail the whole request. `FieldMissing` and `TypeMismatch`
/// are raised while a document runs through the channel and only fail that
/// document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// No builder is registered for the tag
    #[error("unknown stage type '{0}'")]
    UnknownStageType(String),

    /// The stage definition is malformed
    #[error("invalid {stage} stage: {reason}")]
    InvalidStage {
        /// Stage tag, or a placeholder when the tag itself is unreadable
        stage: String,
        /// What is wrong with it
        reason: String,
    },

    /// A field the stage reads is missing from the document
    #[error("{stage}: field '{field}' not found")]
    FieldMissing {
        /// Stage tag
        stage: &'static str,
        /// Missing field
        field: String,
    },

    /// A field the stage reads has the wrong JSON type
    #[error("{stage}: field '{field}' is {found}, expected {expected}")]
    TypeMismatch {
        /// Stage tag
        stage: &'static str,
        /// Offending field
        field: String,
        /// Type the stage accepts
        expected: &'static str,
        /// Type the document holds
        found: &'static str,
    },
}

impl StageError {
    /// Shorthand for [`StageError::InvalidStage`]
    pub fn invalid(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStage {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::UnknownStageType(_) => ErrorKind::UnknownStageType,
            StageError::InvalidStage { .. } => ErrorKind::InvalidStage,
            StageError::FieldMissing { .. } => ErrorKind::StageFieldMissing,
            StageError::TypeMismatch { .. } => ErrorKind::StageTypeMismatch,
        }
    }
}
