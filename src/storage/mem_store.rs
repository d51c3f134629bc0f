//! In-memory document storage
//!
//! Entries live in a `BTreeMap` behind a `parking_lot::RwLock`, giving id
//! ordered iteration for `get_all`. Documents are stored behind `Arc`, so a
//! snapshot copies pointers rather than JSON trees.

use std::collections::btree_map::Entry as MapEntry;
use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::storage::{DocumentStorage, Entry};
use crate::types::Document;

/// Ordered in-memory storage for one database
#[derive(Default)]
pub struct MemStorage {
    documents: RwLock<BTreeMap<String, Arc<Document>>>,
}

impl MemStorage {
    /// Create an empty storage instance
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStorage for MemStorage {
    fn put(&self, id: &str, doc: Document) -> bool {
        let doc = Arc::new(doc);
        self.documents.write().insert(id.to_string(), doc).is_some()
    }

    fn insert_new(&self, id: &str, doc: Document) -> Result<(), Document> {
        match self.documents.write().entry(id.to_string()) {
            MapEntry::Occupied(_) => Err(doc),
            MapEntry::Vacant(slot) => {
                slot.insert(Arc::new(doc));
                Ok(())
            }
        }
    }

    fn get(&self, id: &str) -> Option<Arc<Document>> {
        self.documents.read().get(id).cloned()
    }

    fn get_all(&self) -> Vec<Entry> {
        self.documents
            .read()
            .iter()
            .map(|(id, doc)| (id.clone(), Arc::clone(doc)))
            .collect()
    }

    fn contains(&self, id: &str) -> bool {
        self.documents.read().contains_key(id)
    }

    fn len(&self) -> usize {
        self.documents.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let storage = MemStorage::new();
        assert!(!storage.put("a", doc(json!({"x": 1}))));
        assert_eq!(*storage.get("a").unwrap(), doc(json!({"x": 1})));
        assert!(storage.get("b").is_none());
    }

    #[test]
    fn test_put_replaces_whole_entry() {
        let storage = MemStorage::new();
        storage.put("a", doc(json!({"x": 1, "y": 2})));
        assert!(storage.put("a", doc(json!({"z": 3}))));

        let all = storage.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(*all[0].1, doc(json!({"z": 3})));
    }

    #[test]
    fn test_insert_new_keeps_existing_entry() {
        let storage = MemStorage::new();
        assert!(storage.insert_new("a", doc(json!({"x": 1}))).is_ok());

        let rejected = storage.insert_new("a", doc(json!({"x": 2}))).unwrap_err();
        assert_eq!(rejected, doc(json!({"x": 2})));
        assert_eq!(*storage.get("a").unwrap(), doc(json!({"x": 1})));
    }

    #[test]
    fn test_get_all_is_ordered_snapshot() {
        let storage = MemStorage::new();
        for id in ["c", "a", "b"] {
            storage.put(id, doc(json!({"id": id})));
        }

        let snapshot = storage.get_all();
        storage.put("d", Document::new());

        let ids: Vec<&str> = snapshot.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(storage.len(), 4);
    }

    #[test]
    fn test_concurrent_writers_never_tear() {
        let storage = Arc::new(MemStorage::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let storage = Arc::clone(&storage);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        storage.put("shared", doc(json!({"a": t * 1000 + i, "b": t * 1000 + i})));
                        let seen = storage.get("shared").unwrap();
                        assert_eq!(seen.get("a"), seen.get("b"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(storage.len(), 1);
    }
}
