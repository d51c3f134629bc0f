//! Storage factory for creating storage instances based on configuration

use std::sync::Arc;

use crate::core::config::{StorageConfig, StorageType};
use crate::core::Result;
use crate::storage::{DocumentStorage, MemStorage};

/// Builds the backend for a newly created database, given its name
pub type StorageFactory = Arc<dyn Fn(&str) -> Box<dyn DocumentStorage> + Send + Sync>;

/// Create a storage factory matching the configured backend
pub fn create_storage_factory(config: &StorageConfig) -> Result<StorageFactory> {
    match config.storage_type {
        StorageType::Memory => Ok(Arc::new(|_name: &str| -> Box<dyn DocumentStorage> {
            Box::new(MemStorage::new())
        })),
    }
}
