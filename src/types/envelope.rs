//! Result envelope
//!
//! Every core operation ends in an [`Envelope`]. It only states what
//! happened; choosing a wire shape and a status code is the HTTP layer's job.

use serde::Serialize;
use serde_json::Value;

use crate::core::{Error, ErrorKind};

/// Outcome of one core operation
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Whether the operation failed
    pub error: bool,
    /// Human readable failure cause
    pub cause: Option<String>,
    /// Failure classification
    pub kind: Option<ErrorKind>,
    /// Database the operation addressed
    pub db: Option<String>,
    /// Operation specific data
    pub payload: Payload,
}

/// Operation specific part of an [`Envelope`]
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Nothing to report
    Empty,
    /// A write stored a document under `id`
    Written {
        /// Resolved document id
        id: String,
        /// Whether an existing entry was replaced
        replaced: bool,
    },
    /// One document, with its implicit `id` field
    Document(Value),
    /// Every document of a database, in id order
    Documents(Vec<Value>),
    /// Database names
    Databases(Vec<String>),
    /// Per-document outcomes of a bulk transform
    Batch {
        /// One entry per processed document, in id order
        outcomes: Vec<BatchItem>,
        /// False when the run was cancelled before the last document
        complete: bool,
    },
}

/// One document's result inside a bulk transform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    /// Id of the source document
    pub id: String,
    /// Whether this document's pipeline failed
    pub error: bool,
    /// Failure cause
    pub cause: Option<String>,
    /// Failure classification
    pub kind: Option<ErrorKind>,
    /// Transformed document, present on success
    pub document: Option<Value>,
}

impl Envelope {
    /// Successful outcome
    pub fn ok(db: Option<String>, payload: Payload) -> Self {
        Self {
            error: false,
            cause: None,
            kind: None,
            db,
            payload,
        }
    }

    /// Failed outcome
    pub fn failure(db: Option<String>, err: &Error) -> Self {
        Self {
            error: true,
            cause: Some(err.to_string()),
            kind: Some(err.kind()),
            db,
            payload: Payload::Empty,
        }
    }

    /// Fold an operation result into an envelope
    pub fn from_result(db: Option<String>, result: crate::core::Result<Payload>) -> Self {
        match result {
            Ok(payload) => Self::ok(db, payload),
            Err(err) => Self::failure(db, &err),
        }
    }

    /// The resolved id of a successful write
    pub fn written_id(&self) -> Option<&str> {
        match &self.payload {
            Payload::Written { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl BatchItem {
    /// Successful document
    pub fn success(id: String, document: Value) -> Self {
        Self {
            id,
            error: false,
            cause: None,
            kind: None,
            document: Some(document),
        }
    }

    /// Failed document
    pub fn failure(id: String, err: &Error) -> Self {
        Self {
            id,
            error: true,
            cause: Some(err.to_string()),
            kind: Some(err.kind()),
            document: None,
        }
    }
}
