//! Type definitions shared across the crate

/// Documents and JSON field helpers
pub mod document;

/// Reserved and literal path tokens
pub mod token;

/// Result envelope returned by every core operation
pub mod envelope;

pub use document::Document;
pub use envelope::{BatchItem, Envelope, Payload};
pub use token::{PathToken, ReadTarget};
