//! Path tokens
//!
//! The last path segment of a request is either a literal id or one of the
//! reserved tokens. It is parsed once, at the routing boundary, and business
//! logic only ever sees the typed form.

use std::fmt;

use crate::constants::{ALL_TOKEN, AUTO_TIME_TOKEN, AUTO_TOKEN};
use crate::core::{Error, Result};

/// A parsed path segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathToken {
    /// `_auto`: generate a random id
    Auto,
    /// `_auto_time`: generate a time-ordered id
    AutoTime,
    /// `_all`: every document of the database
    All,
    /// Anything else, used verbatim as a document id
    Id(String),
}

/// What a read or transform request operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadTarget {
    /// A single document
    One(String),
    /// Every document, in id order
    All,
}

impl PathToken {
    /// Parse a raw path segment
    pub fn parse(segment: &str) -> Self {
        match segment {
            AUTO_TOKEN => PathToken::Auto,
            AUTO_TIME_TOKEN => PathToken::AutoTime,
            ALL_TOKEN => PathToken::All,
            id => PathToken::Id(id.to_string()),
        }
    }

    /// Interpret this token as the target of a read
    ///
    /// Id-generation sentinels make no sense on reads and are rejected.
    pub fn into_read_target(self) -> Result<ReadTarget> {
        match self {
            PathToken::Id(id) => Ok(ReadTarget::One(id)),
            PathToken::All => Ok(ReadTarget::All),
            reserved => Err(Error::ReservedToken(reserved.to_string())),
        }
    }
}

impl From<&str> for PathToken {
    fn from(segment: &str) -> Self {
        PathToken::parse(segment)
    }
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathToken::Auto => f.write_str(AUTO_TOKEN),
            PathToken::AutoTime => f.write_str(AUTO_TIME_TOKEN),
            PathToken::All => f.write_str(ALL_TOKEN),
            PathToken::Id(id) => f.write_str(id),
        }
    }
}
