//! Database registry - name to database mapping

use dashmap::DashMap;
use std::sync::Arc;

use crate::storage::{Database, StorageFactory};

/// Maps database names to their single [`Database`] instance
///
/// Constructed once at startup and passed to everything that needs it.
/// Databases are created on first write and never removed.
pub struct DatabaseRegistry {
    /// Lock-free map of database name to instance
    databases: DashMap<String, Arc<Database>>,
    /// Function to create new storage instances
    storage_factory: StorageFactory,
}

impl DatabaseRegistry {
    /// Create a registry with a factory function for storage instances
    pub fn new(storage_factory: StorageFactory) -> Self {
        Self {
            databases: DashMap::new(),
            storage_factory,
        }
    }

    /// Get or create the database named `name`
    ///
    /// The entry API holds the shard lock while the storage is built, so two
    /// racing callers always end up with the same instance.
    pub fn get_or_create(&self, name: &str) -> Arc<Database> {
        if let Some(db) = self.databases.get(name) {
            return Arc::clone(db.value());
        }

        self.databases
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::info!(db = name, "creating database");
                Arc::new(Database::new(name, (self.storage_factory)(name)))
            })
            .clone()
    }

    /// Get an existing database
    pub fn get(&self, name: &str) -> Option<Arc<Database>> {
        self.databases.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Sorted names of every database
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Get the number of databases
    pub fn database_count(&self) -> usize {
        self.databases.len()
    }
}
