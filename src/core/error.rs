//! Error types and handling for sledge
//!
//! Every core operation fails with [`Error`]. None of the variants are
//! process-fatal: they are recovered at the operation boundary and turned into
//! an error [`Envelope`](crate::types::Envelope) carrying the [`ErrorKind`].

use serde::Serialize;
use thiserror::Error;

use crate::channel::StageError;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sledge
#[derive(Error, Debug)]
pub enum Error {
    /// No identity source could be resolved for a write
    #[error("no id found for the document: use a path id, _auto, _auto_time or id_path")]
    MissingId,

    /// The field named by `id_path` is not present in the body
    #[error("id field '{0}' not found in document")]
    MissingIdField(String),

    /// Read against a database that was never written to
    #[error("database '{0}' not found")]
    DatabaseNotFound(String),

    /// Read of an id that is not stored
    #[error("document '{id}' not found in database '{db}'")]
    DocumentNotFound {
        /// Database that was searched
        db: String,
        /// Id that was requested
        id: String,
    },

    /// Random id generation kept hitting existing ids
    #[error("could not generate a unique id after {0} attempts")]
    IdCollision(u32),

    /// A reserved path token was used where it has no meaning
    #[error("reserved path token '{0}' cannot be used here")]
    ReservedToken(String),

    /// A stored channel was requested by a name nobody saved
    #[error("channel '{0}' not found")]
    ChannelNotFound(String),

    /// The transform request carries no usable channel
    #[error("invalid channel: {0}")]
    InvalidChannel(String),

    /// A channel stage failed to compile or to run
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable classification of an [`Error`], independent of its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`Error::MissingId`]
    MissingId,
    /// See [`Error::MissingIdField`]
    MissingIdField,
    /// See [`Error::DatabaseNotFound`]
    DatabaseNotFound,
    /// See [`Error::DocumentNotFound`]
    DocumentNotFound,
    /// See [`Error::IdCollision`]
    IdCollision,
    /// See [`Error::ChannelNotFound`]
    ChannelNotFound,
    /// A stage referenced a field the document does not have
    StageFieldMissing,
    /// A stage found a field of the wrong JSON type
    StageTypeMismatch,
    /// The channel names a stage kind nobody registered
    UnknownStageType,
    /// A stage definition is malformed
    InvalidStage,
    /// Bad request input, including reserved tokens and bad channels
    InvalidInput,
    /// Anything the caller cannot fix
    Internal,
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingId => ErrorKind::MissingId,
            Error::MissingIdField(_) => ErrorKind::MissingIdField,
            Error::DatabaseNotFound(_) => ErrorKind::DatabaseNotFound,
            Error::DocumentNotFound { .. } => ErrorKind::DocumentNotFound,
            Error::IdCollision(_) => ErrorKind::IdCollision,
            Error::ChannelNotFound(_) => ErrorKind::ChannelNotFound,
            Error::Stage(stage) => stage.kind(),
            Error::ReservedToken(_) | Error::InvalidChannel(_) | Error::InvalidInput(_) | Error::Json(_) => {
                ErrorKind::InvalidInput
            }
            Error::Config(_) | Error::Io(_) | Error::Metrics(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::IdCollision | ErrorKind::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_variants() {
        assert_eq!(Error::MissingId.kind(), ErrorKind::MissingId);
        assert_eq!(Error::MissingIdField("a".into()).kind(), ErrorKind::MissingIdField);
        assert_eq!(Error::ReservedToken("_all".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(Error::ChannelNotFound("c".into()).kind(), ErrorKind::ChannelNotFound);
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(json).kind(), ErrorKind::InvalidInput);
        assert_eq!(
            Error::from(StageError::UnknownStageType("grok".into())).kind(),
            ErrorKind::UnknownStageType
        );
    }

    #[test]
    fn test_server_and_client_classes() {
        assert!(Error::IdCollision(8).is_server_error());
        assert!(Error::internal("boom").is_server_error());
        assert!(Error::MissingId.is_client_error());
        assert!(Error::DatabaseNotFound("db".into()).is_client_error());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::StageFieldMissing).unwrap();
        assert_eq!(json, "\"stage_field_missing\"");
    }
}
