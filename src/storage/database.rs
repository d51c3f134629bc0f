//! A single named database

use std::sync::Arc;

use crate::ids::SequenceCounters;
use crate::storage::{DocumentStorage, Entry};
use crate::types::Document;

/// One database: a storage backend plus its `_auto_time` counters
///
/// Handles are shared as `Arc<Database>`; the registry guarantees there is
/// exactly one instance per name.
pub struct Database {
    name: String,
    storage: Box<dyn DocumentStorage>,
    sequences: SequenceCounters,
}

impl Database {
    /// Wrap a storage backend
    pub fn new(name: impl Into<String>, storage: Box<dyn DocumentStorage>) -> Self {
        Self {
            name: name.into(),
            storage,
            sequences: SequenceCounters::default(),
        }
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or replace a document, returning whether it existed before
    pub fn put(&self, id: &str, doc: Document) -> bool {
        self.storage.put(id, doc)
    }

    /// Insert a document only if `id` is free, handing it back otherwise
    pub fn insert_new(&self, id: &str, doc: Document) -> Result<(), Document> {
        self.storage.insert_new(id, doc)
    }

    /// Get a document by id
    pub fn get(&self, id: &str) -> Option<Arc<Document>> {
        self.storage.get(id)
    }

    /// Ordered snapshot of every entry
    pub fn get_all(&self) -> Vec<Entry> {
        self.storage.get_all()
    }

    /// Check if a document exists
    pub fn contains(&self, id: &str) -> bool {
        self.storage.contains(id)
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether the database holds no documents
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Sequence counters backing time-ordered ids
    pub fn sequences(&self) -> &SequenceCounters {
        &self.sequences
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("documents", &self.len())
            .finish()
    }
}
