//! Storage layer for sledge
//!
//! Databases are isolated from each other: each one owns its own
//! [`DocumentStorage`] backend and its own lock, so traffic on one database
//! never waits on another. The [`DatabaseRegistry`] hands databases out by
//! name and creates them on first write.

use std::sync::Arc;

use crate::types::Document;

/// Ordered in-memory backend
pub mod mem_store;

/// A named database and its sequence counters
pub mod database;

/// Name to database mapping
pub mod registry;

/// Backend selection from configuration
pub mod factory;

/// Windows over multi-document reads
pub mod range;

pub use database::Database;
pub use factory::{create_storage_factory, StorageFactory};
pub use mem_store::MemStorage;
pub use range::RangeOptions;
pub use registry::DatabaseRegistry;

/// A stored entry: document id and a shared, immutable document
pub type Entry = (String, Arc<Document>);

/// Contract every storage backend fulfils
///
/// Implementations must make `put`, `get` and `get_all` linearizable with
/// respect to each other: a reader sees either all or none of a concurrent
/// `put`, never a partial document.
pub trait DocumentStorage: Send + Sync {
    /// Insert or fully replace the entry for `id`
    ///
    /// Returns `true` when an entry already existed.
    fn put(&self, id: &str, doc: Document) -> bool;

    /// Insert under `id` only if no entry exists yet
    ///
    /// The check and the insert happen under one lock. On conflict the
    /// document is handed back untouched.
    fn insert_new(&self, id: &str, doc: Document) -> Result<(), Document>;

    /// Get a document by id
    fn get(&self, id: &str) -> Option<Arc<Document>>;

    /// Point-in-time copy of every entry, ordered by id
    fn get_all(&self) -> Vec<Entry>;

    /// Check if a document exists
    fn contains(&self, id: &str) -> bool;

    /// Number of stored documents
    fn len(&self) -> usize;

    /// Whether the backend holds no documents
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
